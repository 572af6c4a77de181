//! Mailchimp audience API client

use serde::Serialize;
use std::future::Future;

use super::MailingList;
use crate::config::SubscribeConfig;
use crate::error::SubscribeError;

/// API credentials, read from the environment at call time
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub audience_id: String,
    pub api_key: String,
}

impl Credentials {
    /// Read credentials from the variables named in the config
    pub fn from_env(config: &SubscribeConfig) -> Result<Self, SubscribeError> {
        Ok(Self {
            audience_id: read_env(&config.audience_id_env)?,
            api_key: read_env(&config.api_key_env)?,
        })
    }

    /// Data center suffix of the API key (`<key>-us3` is `us3`)
    pub fn data_center(&self) -> Result<&str, SubscribeError> {
        match self.api_key.rsplit_once('-') {
            Some((key, dc)) if !key.is_empty() && !dc.is_empty() => Ok(dc),
            _ => Err(SubscribeError::Config(
                "API key has no data center suffix".to_string(),
            )),
        }
    }

    /// Members endpoint of the audience, on `api_base` when given
    pub fn members_url(&self, api_base: Option<&str>) -> Result<String, SubscribeError> {
        let base = match api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.mailchimp.com", self.data_center()?),
        };
        Ok(format!("{}/3.0/lists/{}/members", base, self.audience_id))
    }
}

fn read_env(name: &str) -> Result<String, SubscribeError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SubscribeError::Config(format!("{} is not set", name))),
    }
}

#[derive(Serialize)]
struct NewMember<'a> {
    email_address: &'a str,
    /// `subscribed` skips the double opt-in mail
    status: &'a str,
}

/// Mailchimp-backed mailing list
#[derive(Debug, Clone)]
pub struct Mailchimp {
    http: reqwest::Client,
    config: SubscribeConfig,
}

impl Mailchimp {
    pub fn new(config: SubscribeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post_member(&self, email: &str) -> Result<u16, SubscribeError> {
        let credentials = Credentials::from_env(&self.config)?;
        let url = credentials.members_url(self.config.api_base.as_deref())?;

        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("apikey {}", credentials.api_key),
            )
            .json(&NewMember {
                email_address: email,
                status: "subscribed",
            })
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

impl MailingList for Mailchimp {
    fn add_member(&self, email: &str) -> impl Future<Output = Result<u16, SubscribeError>> + Send {
        self.post_member(email)
    }
}
