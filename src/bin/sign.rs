use std::path::Path;

use anyhow::Context;
use clap::Parser;
use log::info;

use instructor_tools::{
    logger,
    signature::{self, models::Layer},
};

const USAGE: &str = "\
If fourth parameter is \"no\" then signature is rendered over text,
instead of under text. (It should be blank space anyway, under
is slightly better for non-transparent images.)";

#[derive(Parser)]
#[clap(version, about = "Puts a signature on an instructor.cz certificate", long_about = None)]
struct Args {
    /// Certificate to sign, needs a `..........` placeholder line
    #[clap(value_parser)]
    certificate: String,

    /// PDF whose first page is the signature
    #[clap(value_parser)]
    signature: String,

    /// Prepended to the certificate path to name the output
    #[clap(value_parser)]
    output_prefix: String,

    /// `no` (or 0, false, empty) renders the signature over the text
    #[clap(value_parser)]
    under: Option<String>,
}

fn usage() -> ! {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "sign-certificate".to_owned());
    println!("Usage: {program} certificate.pdf signature.pdf output_prefix [no]\n\n{USAGE}");
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    let args = Args::try_parse().unwrap_or_else(|e| match e.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => e.exit(),
        _ => usage(),
    });

    logger::init();

    let layer = args.under.as_deref().map_or(Layer::default(), Layer::from_flag);
    let out = signature::output_path(&args.output_prefix, &args.certificate);

    let placement = signature::add_signature(
        Path::new(&args.certificate),
        Path::new(&args.signature),
        &out,
        layer,
    )
    .with_context(|| format!("Can't sign {}", args.certificate))?;
    info!("Written {} ({placement:?})", out.display());

    Ok(())
}
