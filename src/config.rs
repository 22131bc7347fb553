use std::env::var;

use dotenvy::dotenv;

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub queue_url: Option<String>,
    pub queue_token: Option<String>,
    pub callback_url: Option<String>,
    pub callback_secret: String,
    pub auth_secret: String,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            port: var("PORT")
                .map_err(|_| "An error occured while getting PORT env param")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            scheme: var("SCHEME").map_err(|_| "An error occured while getting SCHEME env param")?,
            host: var("HOST").map_err(|_| "An error occured while getting HOST env param")?,
            database_url: var("DATABASE_URL").ok(),
            nats_url: var("NATS_URL").ok(),
            queue_url: var("QUEUE_URL").ok(),
            queue_token: var("QUEUE_TOKEN").ok(),
            callback_url: var("CALLBACK_URL").ok(),
            callback_secret: var("CALLBACK_SECRET")
                .map_err(|_| "An error occured while getting CALLBACK_SECRET env param")?,
            auth_secret: var("AUTH_SECRET")
                .map_err(|_| "An error occured while getting AUTH_SECRET env param")?,
        })
    }
}
