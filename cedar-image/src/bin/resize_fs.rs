use cedar_hal::LinuxHal;
use cedar_image::cli::ResizeFsCli;
use cedar_image::errors::CedarError;
use cedar_image::logging;
use cedar_image::preflight::{self, PreflightConfig};
use cedar_image::resize::{self, ResizeOptions};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = ResizeFsCli::parse();
    logging::init(cli.verbose);

    if !cli.image.is_file() {
        log::error!("{}", CedarError::ImageNotFound(cli.image.clone()));
        return ExitCode::FAILURE;
    }

    if !cli.skip_preflight {
        if let Err(err) = preflight::run_with(&PreflightConfig::for_resize()) {
            log::error!("{:#}", err);
            return ExitCode::FAILURE;
        }
    }

    let hal = LinuxHal::new();
    let opts = ResizeOptions {
        settle_delay: Duration::from_millis(cli.settle_ms),
    };
    match resize::resize_filesystem(&hal, &cli.image, &opts) {
        Ok(report) => {
            println!(
                "Resized {} in {}",
                report.root_device.display(),
                cli.image.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Error during filesystem operations: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
