//! CLI output formatting

use crate::artifacts::ArtifactDescriptor;
use crate::tasks::{ExecutionStatus, PipelineEvent, TaskReport, TaskState};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a task report for display
pub fn format_task_report(report: &TaskReport) -> String {
    match &report.state {
        TaskState::Completed {
            started_at,
            completed_at,
        } => {
            let millis = completed_at
                .signed_duration_since(*started_at)
                .num_milliseconds();
            format!(
                "{} {} {}",
                CHECK,
                style(&report.task).green(),
                style(format!("({} ms)", millis)).dim()
            )
        }
        TaskState::Skipped { reason } => {
            format!("{} {} {}", SKIP, style(&report.task).dim(), style(reason).dim())
        }
    }
}

/// Format a pipeline event for display
pub fn format_pipeline_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::PipelineStarted {
            execution_id,
            pipeline,
        } => format!(
            "{} Starting {} ({})",
            ROCKET,
            style(pipeline).bold(),
            style(&execution_id.to_string()[..8]).dim()
        ),
        PipelineEvent::TaskStarted { task } => format!("{} {}", SPINNER, style(task).cyan()),
        PipelineEvent::TaskCompleted { task } => format!("{} {}", CHECK, style(task).green()),
        PipelineEvent::TaskSkipped { task, reason } => format!(
            "{} {} ({})",
            SKIP,
            style(task).dim(),
            style(reason).dim()
        ),
        PipelineEvent::TaskFailed { task, error } => {
            format!("{} {}: {}", CROSS, style(task).red(), style(error).dim())
        }
        PipelineEvent::PipelineCompleted {
            execution_id,
            status,
        } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format a resolved artifact for display
pub fn format_descriptor(descriptor: &ArtifactDescriptor) -> String {
    let mut line = format!(
        "{} {} {} [{}]\n    {}",
        CHECK,
        style(&descriptor.product).bold(),
        style(&descriptor.version).cyan(),
        descriptor.platform,
        style(&descriptor.download_url).dim()
    );
    if descriptor.included_out_of_box {
        if let Some(as_of) = &descriptor.shipped_as_of {
            line.push_str(&format!(
                "\n    {}",
                style(format!("shipped out of the box as of {}", as_of)).yellow()
            ));
        }
    }
    line
}
