// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use std::{
    fs::File,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use memmap2::Mmap;
use tracing_subscriber::EnvFilter;

use msfident::{MsfContainer, PdbIdentityReader};

fn print_streams(container: &MsfContainer<'_, Mmap>) {
    for (index, stream) in container.streams().iter().enumerate() {
        if stream.is_nil() {
            println!("  stream {index:>5}: nil");
        } else {
            println!(
                "  stream {index:>5}: {:>10} bytes in {:>6} pages",
                stream.byte_length(),
                stream.pages().len()
            );
        }
    }
}

fn execute(path: &Path, list_streams: bool) -> Result<()> {
    let file = File::open(path).context("failed to open file")?;
    // SAFETY: the mapping is only read, and the file is not expected to be
    // modified while it is inspected.
    let map = unsafe { Mmap::map(&file) }.context("failed to map file")?;
    let container = MsfContainer::open(map).context("failed to open MSF container")?;
    if list_streams {
        println!(
            "{}: page size {}, {} pages, {} streams",
            path.display(),
            container.page_size(),
            container.page_count(),
            container.stream_count()
        );
        print_streams(&container);
    }

    let identity = PdbIdentityReader::new(container)
        .read_identity()
        .context("failed to read PDB identity")?;
    println!(
        "{}\t{}\t{}\t{}",
        path.display(),
        identity.identifier.hyphenated(),
        identity.age,
        identity.symbol_server_key()
    );
    Ok(())
}

fn run(matches: &ArgMatches) -> bool {
    let list_streams = matches.get_flag("streams");
    let mut ok = true;
    for path in matches.get_many::<PathBuf>("path").into_iter().flatten() {
        if let Err(e) = execute(path, list_streams) {
            eprintln!("{}: {e:?}", path.display());
            ok = false;
        }
    }
    ok
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let about = r#"msfident prints the GUID and age that identify PDB files."#;
    let matches = Command::new("msfident")
        .about(about)
        .arg(
            Arg::new("streams")
                .long("streams")
                .action(ArgAction::SetTrue)
                .help("Also list every stream in the container."),
        )
        .arg(
            Arg::new("path")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("The PDB files to inspect."),
        )
        .get_matches();

    if run(&matches) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
