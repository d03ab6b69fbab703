use std::process::Command;
use std::sync::LazyLock;

use dialoguer::{Input, Password};
use log::info;
use regex::Regex;

use crate::error::{Error, Result};

static USER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[Uu]ser(?:name)?\s*[:=]\s*(.*)$").unwrap());

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: String,
}

/// Read the output of a password store entry: password first, then `user: name` somewhere
pub fn parse_pass_output(output: &str) -> Credentials {
    let mut lines = output.split('\n');
    let password = lines.next().unwrap_or_default().trim().to_owned();

    let username = lines
        .filter_map(|line| USER_LINE.captures(line.trim_end_matches('\r')))
        .map(|captures| captures[1].trim().to_owned())
        .last();

    Credentials { username, password }
}

/// Run the password command, i.e.: `pass work/instructor`
pub fn from_command(argv: &[String]) -> Result<Credentials> {
    let Some((program, args)) = argv.split_first() else {
        return Err(Error::PasswordCommand("empty command".to_owned()));
    };

    info!("Reading credentials from `{}`", argv.join(" "));
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(Error::PasswordCommand(format!(
            "`{program}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(parse_pass_output(&String::from_utf8_lossy(&output.stdout)))
}

pub fn prompt_username() -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt("Username")
        .interact_text()?)
}

pub fn prompt_password() -> Result<String> {
    Ok(Password::new().with_prompt("Password").interact()?)
}

/// Username and password, asking for what the command didn't give
pub fn get(argv: &[String]) -> Result<(String, String)> {
    if argv.is_empty() {
        return Ok((prompt_username()?, prompt_password()?));
    }

    let credentials = from_command(argv)?;
    let username = match credentials.username {
        Some(username) => username,
        None => prompt_username()?,
    };

    Ok((username, credentials.password))
}
