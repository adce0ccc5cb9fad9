use std::fs;

use anyhow::anyhow;
use clap::Parser;
use hoard_files::File;
use log::info;

use crate::settings::{CliArgs, LoadMode, OperationMode};

mod dump;
mod settings;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let mut file = File::with_options(args.load_options());
    match &args.operation_mode {
        OperationMode::Tree { path, mode } => {
            match mode {
                LoadMode::Full => file.load_file(path)?,
                LoadMode::First => file.load_first(path)?,
                LoadMode::Shallow => file.load_shallow(path)?,
            }
            println!(
                "{} (version {:#010x}, type {})",
                path.display(),
                file.version(),
                file.file_type()
            );
            println!("{}", dump::render(file.tree(), file.root()));
        }
        OperationMode::Extract { path, guid, out } => {
            file.load_file(path)?;
            let id = file
                .find_object(*guid)
                .ok_or_else(|| anyhow!("{} is not part of {}", guid, path.display()))?;
            let bytes = dump::payload(file.tree_mut(), id)?;
            fs::write(out, &bytes)?;
            info!("Wrote {} bytes to {}", bytes.len(), out.display());
        }
    }

    Ok(())
}
