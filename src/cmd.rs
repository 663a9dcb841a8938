use crate::prelude::*;

const CONFIG_FILE_OPTION: &str = "config-file";

pub fn parse<'a>() -> Result<clap::ArgMatches<'a>> {
    let app = clap::App::new(program_name()?)
        .about("Chat with people from your terminal")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .arg(
            clap::Arg::with_name(CONFIG_FILE_OPTION)
                .long(CONFIG_FILE_OPTION)
                .takes_value(true)
                .value_name("FILE")
                .help("Read configuration from FILE instead of the default location"),
        );
    crate::config::Config::cmd(app)
        .get_matches_safe()
        .context(crate::error::ParseArgs)
}

pub fn run(matches: clap::ArgMatches<'_>) -> Result<()> {
    env_logger::from_env(
        env_logger::Env::default().default_filter_or("error"),
    )
    .init();

    let mut config = crate::config::config(
        matches
            .value_of(CONFIG_FILE_OPTION)
            .map(std::path::Path::new),
    )?;
    config.merge_args(&matches)?;
    log::debug!("{:?}", config);

    crate::client::run(&config.settings()?)
}

fn program_name() -> Result<String> {
    let program =
        std::env::args().next().context(crate::error::MissingArgv)?;
    let path = std::path::Path::new(&program);
    let filename = path.file_name();
    Ok(filename
        .ok_or_else(|| Error::NotAFileName {
            path: path.to_string_lossy().to_string(),
        })?
        .to_string_lossy()
        .to_string())
}
