use clap::{Arg, Command};

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_API_BASE_URL: &str = "api-base-url";

#[must_use]
pub fn subcommand() -> Command {
    Command::new("signup")
        .about("Register a user against a running API")
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long("username")
                .help("Display name")
                .required(true),
        )
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long("email")
                .help("Email address")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Password")
                .required(true),
        )
        .arg(
            Arg::new(ARG_CONFIRM_PASSWORD)
                .long("confirm-password")
                .help("Password again")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long("api-base-url")
                .help("API base URL, defaults to API_BASE_URL or the build-time value"),
        )
}
