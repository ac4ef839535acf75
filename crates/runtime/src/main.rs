use anyhow::Context;
use serde_json::json;

use supplychain_core::Identity;
use supplychain_runtime::{CallScript, Deployment, RuntimeConfig};

fn main() -> anyhow::Result<()> {
    let config = RuntimeConfig::from_env().context("invalid configuration")?;
    supplychain_observability::init(config.log_format);

    let deployer = config.deployer.unwrap_or_else(|| {
        let generated = Identity::new();
        tracing::warn!(deployer = %generated, "SUPPLYCHAIN_DEPLOYER not set; using a generated identity");
        generated
    });

    let deployment = Deployment::deploy(deployer);

    let output = match &config.script {
        Some(path) => {
            let script = CallScript::load(path)?;
            tracing::info!(path = %path.display(), calls = script.calls.len(), "running script");
            serde_json::to_value(deployment.run_script(&script))?
        }
        None => json!({
            "deployer": deployment.deployer(),
            "admins": deployment.admins().admins(),
        }),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to render output")?
    );
    Ok(())
}
