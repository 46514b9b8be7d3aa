use anyhow::Result;
use clap::{error::ErrorKind, Parser};
use kmer_census::cli::opts::Cli;
use kmer_census::engine::phases::{stdout_writer, Run};

fn main() {
    // clap's default `--help`/`--version` handling prints and exits 0; the
    // external contract calls for `-h`/`--help` to exit non-zero, so the
    // help/version text is printed here instead of inside `Cli::parse()`.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{e}");
            std::process::exit(1);
        }
        Err(e) => {
            e.exit();
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
    std::process::exit(0);
}

fn run(cli: Cli) -> Result<()> {
    let resolved = cli.resolve()?;

    let mut stdout = stdout_writer();
    let run = Run {
        params: &resolved.params,
        canonical: resolved.canonical,
        in_path: cli.in_path.as_deref(),
        out_path: cli.out_path.as_deref(),
        input_files: &cli.files,
        mode: resolved.mode,
        extract_policy: resolved.extract_policy.as_ref(),
        quiet: resolved.quiet,
    };
    run.execute(&mut stdout)?;
    std::io::Write::flush(&mut stdout)?;
    Ok(())
}
