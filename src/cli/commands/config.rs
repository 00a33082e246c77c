use crate::config::Config;

pub fn cmd_config_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!(
            "Created default config at {}",
            Config::default_config_path().display()
        );
    } else {
        println!(
            "Config already exists at {}",
            Config::default_config_path().display()
        );
    }
    Ok(())
}

pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if shown.tmdb.api_key.is_some() {
        shown.tmdb.api_key = Some("********".to_string());
    }
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
