use anyhow::Result;
use clap::Parser;
use probeset::cli::{Cli, Commands, LabelArgs};
use probeset::config::{ConfigFile, LabelSettings};
use probeset::pipeline;

fn label_settings(args: &LabelArgs) -> Result<LabelSettings> {
    let file = args.config.as_deref().map(ConfigFile::load).transpose()?;
    let settings = LabelSettings::merge(file, &args.labels, args.matcher);
    log::debug!(
        "Label rules: {:?} ({:?} matching)",
        settings.mapping.entries().collect::<Vec<_>>(),
        settings.matcher
    );
    Ok(settings)
}

fn print_report(text: Option<String>) {
    if let Some(text) = text {
        print!("{text}");
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report { dir, output } => {
            print_report(pipeline::run_report(&dir, &output)?);
        }
        Commands::Counts {
            dir,
            output,
            labels,
        } => {
            let resolver = label_settings(&labels)?.resolver();
            pipeline::run_counts(&dir, &output, resolver.as_ref())?;
        }
        Commands::Sequences {
            dir,
            output,
            labels,
        } => {
            let resolver = label_settings(&labels)?.resolver();
            pipeline::run_sequences(&dir, &output, resolver.as_ref())?;
        }
        Commands::All {
            dir,
            out_dir,
            labels,
        } => {
            let resolver = label_settings(&labels)?.resolver();
            print_report(pipeline::run_all(&dir, &out_dir, resolver.as_ref())?);
        }
        Commands::Inspect { dataset, head } => {
            print!("{}", pipeline::inspect(&dataset, head)?);
        }
    }

    Ok(())
}
