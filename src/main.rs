use std::{ffi::OsString, path::PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{error::ErrorKind, Parser};
use log::{error, info, warn};

use instructor_tools::{
    credentials,
    filter::{self, DEFAULT_DAYS},
    logger,
    portal::{Instructor, PORTAL},
    utils,
};

#[derive(Parser)]
#[clap(
    version,
    about = "Tries to complete active courses and downloads certificates of courses finished in the past days",
    long_about = None
)]
struct Args {
    /// Password command, i.e.: `pass work/instructor`, asks interactively when omitted
    #[clap(
        value_parser,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "pass PASSWORD_PATH"
    )]
    command: Vec<String>,

    /// Portal to log into
    #[clap(short, long, value_name = "URL", default_value = PORTAL)]
    portal: String,

    /// Download certificates of courses finished in the last DAYS days
    #[clap(short, long, default_value_t = DEFAULT_DAYS)]
    days: i64,

    /// Directory where certificates are written
    #[clap(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
}

fn usage() -> ! {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "do-courses".to_owned());
    println!("usage: {program} [pass ZX2C4_PASSWORD_PATH]");
    println!(
        "\nTries to complete active courses and downloads certificates of courses finished in past {DEFAULT_DAYS} days"
    );
    std::process::exit(1);
}

/// Command line arguments, `None` when the invocation is malformed
fn parse_args<I, T>(argv: I) -> Option<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => return None,
    };

    if args.command.first().is_some_and(|program| program != "pass") {
        return None;
    }

    Some(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args_os()).unwrap_or_else(|| usage());

    logger::init();

    let (username, password) = credentials::get(&args.command).context("Can't get credentials")?;

    let instructor = Instructor::new(&args.portal, &utils::user_agent())?;
    let todo = instructor
        .login_get_courses(&username, &password)
        .await
        .context("Login failed")?;
    info!("{} course(s) to do", todo.len());

    for course in &todo {
        if let Err(e) = instructor.do_course(course).await {
            // One failing course doesn't stop the others
            println!("Failure");
            let e = anyhow::Error::new(e).context(format!("Course `{}` failed", course.name));
            error!("{e:?}");
        }
    }

    let passed = instructor
        .passed_courses(None)
        .await
        .context("Can't list passed courses")?;

    let today = Local::now().date_naive();
    for (date, course) in filter::recent(&passed, today, args.days) {
        let dl_to = args
            .out_dir
            .join(utils::certificate_filename(date, &course.name));
        let Some(dl_from) = instructor.certificate_url(course)? else {
            warn!("No certificate link for {}, skipped", course.name);
            continue;
        };
        println!("Download {dl_from} -> {}", dl_to.display());

        let pdf = instructor
            .download_certificate(dl_from)
            .await
            .with_context(|| format!("Can't download the certificate of `{}`", course.name))?;
        std::fs::write(&dl_to, pdf)
            .with_context(|| format!("Can't write {}", dl_to.display()))?;
    }

    println!("Done");
    Ok(())
}
