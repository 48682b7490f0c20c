//! Initial configuration scripts per product family

use crate::artifacts::ServerType;
use crate::cluster::DEMO_ADMIN_PASSWORD;
use crate::version::StructuredVersion;

/// File name of the script written into the node home
pub const INITIAL_CONFIG_SCRIPT: &str = "server-initial-config.sh";

/// First OpenSearch release whose demo configuration demands an admin password
const ADMIN_PASSWORD_REQUIRED_AS_OF: (u64, u64, u64) = (2, 12, 0);

/// Script that installs the security demo configuration, or `None` when the
/// family has no scripted setup
pub fn initial_configuration_script(
    server_type: ServerType,
    version: &StructuredVersion,
) -> Option<String> {
    match server_type {
        ServerType::OpenSearch => Some(opensearch_script(version)),
        ServerType::OpenDistro => Some(opendistro_script()),
        ServerType::ElasticSearch => None,
    }
}

fn opensearch_script(version: &StructuredVersion) -> String {
    let triple = (version.major(), version.minor(), version.patch());
    let password = if triple >= ADMIN_PASSWORD_REQUIRED_AS_OF {
        format!("export OPENSEARCH_INITIAL_ADMIN_PASSWORD='{}'\n", DEMO_ADMIN_PASSWORD)
    } else {
        String::new()
    };

    format!(
        r#"#!/usr/bin/env bash
set -e
{password}SECURITY_PLUGIN="plugins/opensearch-security"
if [ -d "$SECURITY_PLUGIN" ]; then
  chmod +x "$SECURITY_PLUGIN/tools/install_demo_configuration.sh"
  "$SECURITY_PLUGIN/tools/install_demo_configuration.sh" -y -i -s
fi
"#
    )
}

fn opendistro_script() -> String {
    r#"#!/usr/bin/env bash
set -e
SECURITY_PLUGIN="plugins/opendistro_security"
if [ -d "$SECURITY_PLUGIN" ]; then
  chmod +x "$SECURITY_PLUGIN/tools/install_demo_configuration.sh"
  "$SECURITY_PLUGIN/tools/install_demo_configuration.sh" -y -i -s
fi
"#
    .to_string()
}
