//! Run the configured native call

use crate::logger::TARGET;
use anyhow::{Context, Result};
use nbridge_config::BridgeConfig;
use nbridge_runtime::{FunctionSignature, LibraryLoader, LoadError, NativeBridge, NativeValue};

/// Load the configured library and call the configured symbol once
pub fn run(config: &BridgeConfig) -> Result<NativeValue> {
    let loader = LibraryLoader::from_config(&config.library);
    let library = loader.load(&config.library.name).map_err(|err| {
        if let LoadError::NotFound { name, searched } = &err {
            for dir in searched {
                log::warn!(target: TARGET, "no `{}` in {}", name, dir.display());
            }
        }
        err
    })?;

    let signature =
        FunctionSignature::from_config(&config.call).context("Invalid call description")?;
    let args = signature
        .values_from_literals(&config.call.args)
        .with_context(|| format!("Invalid arguments for `{}`", signature))?;

    let bridge = NativeBridge::new();
    // SAFETY: the configured signature is trusted to describe the export.
    let value = unsafe { bridge.invoke(&library, &signature, &args) }?;

    log::info!(
        target: TARGET,
        "{} from `{}` returned {}",
        signature,
        library.name(),
        value
    );
    Ok(value)
}
