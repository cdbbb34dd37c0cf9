// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! `vigsearch`: search for the unknown alphabet or key of Base64-encoded
//! Vigenère ciphertext, printing plausible decodings best first.
//!
//! ```text
//! vigsearch key SGVsbG8gV29ybGQh --max-key-len 3 --key-alphabet ABCabc
//! RUST_LOG=debug vigsearch substitution SGVsbG8g --crib-plaintext Hel
//! vigsearch rotate SGVsbG8gV29ybGQh --key TheGiant
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use vigenere_search::heuristic::{AcceptAll, CommonText, Plausibility, Printable};
use vigenere_search::state::Counters;
use vigenere_search::variants::rotations;
use vigenere_search::{
    Alphabet, Crib, LayerOrder, OutputLayout, Result, SearchConfig, SearchReport, Solution, Unknown,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Search(SearchCommand),
    /// Every rotation of the cipher alphabet as tableau under a known key
    Rotate(RotateArgs),
}

#[derive(Subcommand)]
enum SearchCommand {
    /// Unknown monoalphabetic substitution of the cipher alphabet
    Substitution {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Unknown tableau alphabet under a known repeating key
    Alphabet {
        #[command(flatten)]
        common: CommonArgs,
        /// The known key
        #[arg(short, long)]
        key: String,
    },
    /// Unknown repeating key over the cipher alphabet
    Key {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Unknown key layered with a known key
    DoubleKey {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        key: KeyArgs,
        /// The known key
        #[arg(long)]
        known_key: String,
        /// Which layer was stripped first when decoding
        #[arg(long, value_enum, default_value_t = Order::KnownFirst)]
        order: Order,
        /// Tableau of the known layer, if different from the cipher alphabet
        #[arg(long)]
        known_alphabet: Option<String>,
    },
}

#[derive(Args)]
struct RotateArgs {
    /// The ciphertext
    ciphertext: String,
    /// The known key
    #[arg(short, long)]
    key: String,
    /// Cipher alphabet to rotate
    #[arg(long)]
    alphabet: Option<String>,
    /// Base64 alphabet mapping decoded symbols to sextets
    #[arg(long)]
    encoding: Option<String>,
    /// Which output bytes are plausible
    #[arg(long, value_enum, default_value_t = Heuristic::Printable)]
    heuristic: Heuristic,
    /// Rotations to print
    #[arg(long, default_value_t = 20)]
    show: usize,
}

#[derive(Args)]
struct KeyArgs {
    /// Longest key to try
    #[arg(long, default_value_t = 8)]
    max_key_len: usize,
    /// Symbols the key may use; defaults to the cipher alphabet
    #[arg(long)]
    key_alphabet: Option<String>,
}

#[derive(Args)]
struct CommonArgs {
    /// The ciphertext
    ciphertext: String,
    /// Cipher alphabet
    #[arg(long)]
    alphabet: Option<String>,
    /// Base64 alphabet mapping decoded symbols to sextets
    #[arg(long)]
    encoding: Option<String>,
    /// Which output bytes are plausible
    #[arg(long, value_enum, default_value_t = Heuristic::Printable)]
    heuristic: Heuristic,
    /// How decoded symbols become output
    #[arg(long, value_enum, default_value_t = Layout::Base64)]
    layout: Layout,
    /// Known start of the plaintext
    #[arg(long)]
    crib_plaintext: Vec<String>,
    /// Known start of the unknown key
    #[arg(long)]
    crib_key: Vec<String>,
    /// Known alphabet slots, `_` for unknown
    #[arg(long)]
    crib_alphabet: Vec<String>,
    /// Worker threads
    #[arg(short, long, default_value_t = 1)]
    threads: usize,
    /// Stop after this many solutions
    #[arg(short, long)]
    limit: Option<usize>,
    /// Solutions to print
    #[arg(long, default_value_t = 20)]
    show: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Heuristic {
    /// Printable ASCII, space to `~`
    Printable,
    /// Printable ASCII, space to `z`
    Legacy,
    /// Letters, digits and common punctuation
    Common,
    /// Any byte
    Any,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    Base64,
    Direct,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    KnownFirst,
    UnknownFirst,
}

fn alphabet_or(arg: &Option<String>, default: &Alphabet) -> Result<Alphabet> {
    match arg {
        Some(symbols) => Alphabet::new(symbols.as_bytes()),
        None => Ok(default.clone()),
    }
}

fn plausibility(heuristic: Heuristic) -> Arc<dyn Plausibility> {
    match heuristic {
        Heuristic::Printable => Arc::new(Printable::STRICT),
        Heuristic::Legacy => Arc::new(Printable::LEGACY),
        Heuristic::Common => Arc::new(CommonText),
        Heuristic::Any => Arc::new(AcceptAll),
    }
}

fn build(command: &SearchCommand) -> Result<(SearchConfig, &CommonArgs)> {
    let common = match command {
        SearchCommand::Substitution { common }
        | SearchCommand::Alphabet { common, .. }
        | SearchCommand::Key { common, .. }
        | SearchCommand::DoubleKey { common, .. } => common,
    };
    let alphabet = alphabet_or(&common.alphabet, &Alphabet::base64())?;
    let encoding = alphabet_or(&common.encoding, &Alphabet::base64())?;

    let unknown = match command {
        SearchCommand::Substitution { .. } => Unknown::SubstitutionAlphabet,
        SearchCommand::Alphabet { key, .. } => Unknown::VigenereAlphabet {
            key: key.as_bytes().to_vec(),
        },
        SearchCommand::Key { key, .. } => Unknown::VigenereKey {
            key_alphabet: alphabet_or(&key.key_alphabet, &alphabet)?,
            max_key_len: key.max_key_len,
        },
        SearchCommand::DoubleKey {
            key,
            known_key,
            order,
            known_alphabet,
            ..
        } => Unknown::DoubleVigenereKey {
            known_key: known_key.as_bytes().to_vec(),
            known_alphabet: known_alphabet
                .as_ref()
                .map(|a| Alphabet::new(a.as_bytes()))
                .transpose()?,
            order: match order {
                Order::KnownFirst => LayerOrder::KnownFirst,
                Order::UnknownFirst => LayerOrder::UnknownFirst,
            },
            key_alphabet: alphabet_or(&key.key_alphabet, &alphabet)?,
            max_key_len: key.max_key_len,
        },
    };

    let plausibility = plausibility(common.heuristic);
    let layout = match common.layout {
        Layout::Base64 => OutputLayout::Base64,
        Layout::Direct => OutputLayout::Direct,
    };

    let mut config = SearchConfig::new(common.ciphertext.as_bytes(), unknown)
        .with_alphabet(alphabet)
        .with_encoding(encoding)
        .with_layout(layout)
        .with_shared_plausibility(plausibility);
    for crib in &common.crib_plaintext {
        config = config.with_crib(Crib::Plaintext(crib.as_bytes().to_vec()));
    }
    for crib in &common.crib_key {
        config = config.with_crib(Crib::Key(crib.as_bytes().to_vec()));
    }
    for crib in &common.crib_alphabet {
        let slots = crib.bytes().map(|b| (b != b'_').then_some(b)).collect();
        config = config.with_crib(Crib::Alphabet(slots));
    }
    Ok((config, common))
}

fn print_solution(rank: usize, solution: &Solution) {
    let mut line = format!("{rank:>4}  {:.3}  {:?}", solution.entropy(), solution.plaintext_lossy());
    if let Some(alphabet) = solution.alphabet_string('_') {
        line.push_str(&format!("  alphabet={alphabet}"));
    }
    if let Some(key) = solution.key_string() {
        line.push_str(&format!("  key={key}"));
    }
    println!("{line}");
}

fn print_report(report: &mut SearchReport, show: usize) {
    report
        .solutions
        .sort_by(|a, b| a.entropy().total_cmp(&b.entropy()).then_with(|| a.cmp(b)));
    for (rank, solution) in report.solutions.iter().take(show).enumerate() {
        print_solution(rank + 1, solution);
    }
    let stats = &report.statistics;
    println!(
        "{} solutions ({}), {} steps, {} branch points, {} prunes",
        stats.get(Counters::Solutions),
        if report.exhausted { "exhaustive" } else { "stopped at limit" },
        stats.get(Counters::Steps),
        stats.get(Counters::BranchPoints),
        stats.get(Counters::Prunes)
    );
}

fn rotate(args: &RotateArgs) -> Result<()> {
    let alphabet = alphabet_or(&args.alphabet, &Alphabet::base64())?;
    let encoding = alphabet_or(&args.encoding, &Alphabet::base64())?;
    let found = rotations(
        args.ciphertext.as_bytes(),
        args.key.as_bytes(),
        &alphabet,
        &encoding,
        plausibility(args.heuristic).as_ref(),
    )?;
    for (rank, rotation) in found.iter().take(args.show).enumerate() {
        println!(
            "{:>4}  {:.3}  {:?}  shift={}",
            rank + 1,
            rotation.entropy,
            String::from_utf8_lossy(&rotation.plaintext),
            rotation.shift
        );
    }
    println!("{} of {} rotations plausible", found.len(), alphabet.len());
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let command = match &cli.command {
        Commands::Search(command) => command,
        Commands::Rotate(args) => return rotate(args),
    };
    let (config, common) = build(command)?;
    let search = config.prepare()?;
    info!(
        "Prepared {} search over {} symbols",
        config.unknown().name(),
        search.ciphertext().len()
    );
    let mut report = if common.threads > 1 {
        search.run_parallel(common.threads, common.limit)
    } else {
        search.collect_up_to(common.limit)
    };
    print_report(&mut report, common.show);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
