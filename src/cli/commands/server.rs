use clap::{builder::PossibleValuesParser, Arg, Command};

pub const ARG_PORT: &str = "port";
pub const ARG_ORIGIN: &str = "origin";
pub const ARG_DSN: &str = "dsn";
pub const ARG_ENVIRONMENT: &str = "environment";

// Global so `gavel --dsn ...` and `gavel server --dsn ...` parse the same way.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("5000")
                .env("PORT")
                .global(true)
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ORIGIN)
                .long("origin")
                .help("Frontend origin allowed by CORS, example: http://localhost:3000")
                .env("ORIGIN")
                .global(true),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("DATABASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long("environment")
                .help("Deployment environment, production requires --origin")
                .default_value("development")
                .env("GAVEL_ENV")
                .global(true)
                .value_parser(PossibleValuesParser::new(["development", "production"])),
        )
}

#[must_use]
pub fn subcommand() -> Command {
    Command::new("server").about("Run the HTTP API (default)")
}
