use cedar_image::cli::SetHostnameCli;
use cedar_image::hostname::{self, MdnsStatus};
use cedar_image::{logging, preflight};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = SetHostnameCli::parse();
    logging::init(cli.verbose);
    preflight::warn_if_not_mounted(&cli.root);

    match hostname::set_hostname(&cli.root, &cli.hostname) {
        Ok(report) => {
            println!();
            println!("Successfully configured hostname to '{}.local'", report.hostname);
            if report.mdns == MdnsStatus::Enabled || report.mdns == MdnsStatus::AlreadyEnabled {
                println!(
                    "After first boot, the Raspberry Pi should be accessible as '{}.local'",
                    report.hostname
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Failed to configure hostname: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
