use cedar_image::ap_setup;
use cedar_image::cli::InstallApSetupCli;
use cedar_image::config::RootfsLayout;
use cedar_image::{logging, preflight};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = InstallApSetupCli::parse();
    logging::init(cli.verbose);
    preflight::warn_if_not_mounted(&cli.root);

    let layout = RootfsLayout::new(&cli.root);
    match ap_setup::install_ap_setup(&layout, &cli.source_dir) {
        Ok(report) => {
            println!(
                "Successfully installed AP setup ({} files, {} services enabled)",
                report.copied.len(),
                report.links.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Error installing AP setup: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
