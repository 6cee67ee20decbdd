use std::collections::HashMap;
use log::debug;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::error::{Error, Result};
use crate::api::{Request, Response};

pub struct Odoo {
    host: String,
    database: String,
    uid: Option<u32>,
    password: Option<String>,
    client: reqwest::blocking::Client,
}

impl Odoo {
    pub fn new(host: &str, database: &str) -> Odoo {
        Odoo {
            host: host.trim_end_matches('/').to_string(),
            database: database.to_string(),
            uid: None,
            password: None,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn new_and_login(host: &str, database: &str, login: &str, password: &str) -> Result<Odoo> {
        let mut odoo = Odoo::new(host, database);
        odoo.login(login, password)?;
        Ok(odoo)
    }

    pub fn login(&mut self, login: &str, password: &str) -> Result<u32> {
        let request = Request::new("common", Some("authenticate"), (
            self.database.as_str(),
            login,
            password,
            json!({}),
        ));
        let response: Response<Value> = self.send(&request)?;
        // Odoo answers `false` instead of a uid when the credentials are refused
        let uid = response
            .into_result()?
            .as_u64()
            .filter(|uid| *uid > 0)
            .ok_or_else(|| Error::AuthenticationFailed {
                login: login.to_string(),
                database: self.database.clone(),
            })? as u32;
        debug!("Authenticated {} on {} (uid {})", login, self.database, uid);
        self.uid = Some(uid);
        self.password = Some(password.to_string());
        Ok(uid)
    }

    /// Server version information (`server_version`, `protocol_version`, ...).
    pub fn version(&self) -> Result<HashMap<String, Value>> {
        let request: Request<()> = Request::new("common", Some("version"), ());
        let response: Response<HashMap<String, Value>> = self.send(&request)?;
        response.into_result()
    }

    /// `execute_kw` on `model`, returning the raw response.
    pub fn call<T: Serialize, U: DeserializeOwned>(&self, model: &str, method: &str, args: T, kwargs: Value) -> Result<Response<U>> {
        let password = self.password.as_deref().ok_or(Error::NotLoggedIn)?;

        let request = Request::new("object", None, (
            self.database.as_str(),
            self.uid,
            password,
            model,
            method,
            args,
            kwargs,
        ));

        self.send(&request)
    }

    /// Like [`Odoo::call`] but unwraps the result.
    pub fn call_kw<T: Serialize, U: DeserializeOwned>(&self, model: &str, method: &str, args: T, kwargs: Value) -> Result<U> {
        self.call(model, method, args, kwargs)?.into_result()
    }

    pub fn search<D: Serialize>(&self, model: &str, domain: D) -> Result<Vec<u32>> {
        self.call_kw(model, "search", (domain,), json!({}))
    }

    pub fn search_count<D: Serialize>(&self, model: &str, domain: D) -> Result<u64> {
        self.call_kw(model, "search_count", (domain,), json!({}))
    }

    pub fn search_read<D: Serialize, U: DeserializeOwned>(
        &self,
        model: &str,
        domain: D,
        fields: Option<Vec<&str>>,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<U>> {
        let mut kwargs = json!({});
        if let Some(fields) = fields {
            kwargs["fields"] = json!(fields);
        }
        if let Some(offset) = offset {
            kwargs["offset"] = json!(offset);
        }
        if let Some(limit) = limit {
            kwargs["limit"] = json!(limit);
        }
        self.call_kw(model, "search_read", (domain,), kwargs)
    }

    pub fn read<U: DeserializeOwned>(&self, model: &str, ids: &[u32], fields: Option<Vec<&str>>) -> Result<Vec<U>> {
        let kwargs = match fields {
            Some(fields) => json!({ "fields": fields }),
            None => json!({}),
        };
        self.call_kw(model, "read", (ids,), kwargs)
    }

    pub fn read_group<D: Serialize, U: DeserializeOwned>(&self, model: &str, domain: D, fields: Vec<&str>, groupby: Vec<&str>) -> Result<Vec<U>> {
        self.call_kw(model, "read_group", (domain, fields, groupby), json!({ "lazy": true }))
    }

    pub fn fields_get<U: DeserializeOwned>(&self, model: &str, fields: Vec<&str>, attributes: Vec<&str>) -> Result<HashMap<String, U>> {
        self.call_kw(model, "fields_get", (fields,), json!({ "attributes": attributes }))
    }

    pub fn default_get(&self, model: &str, fields: Vec<&str>) -> Result<HashMap<String, Value>> {
        self.call_kw(model, "default_get", (fields,), json!({}))
    }

    fn send<T: Serialize, U: DeserializeOwned>(&self, request: &Request<T>) -> Result<Response<U>> {
        let url = format!("{}/jsonrpc", self.host);
        let resp = self.client.post(&url)
            .json(&request)
            .send()?
            .error_for_status()?;
        Ok(resp.json()?)
    }
}

/// Odoo sends `false` for empty values of non-boolean fields.
pub fn deserialize_odoo_nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        value => T::deserialize(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Like [`deserialize_odoo_nullable`] but renders any scalar as text.
///
/// Used for attributes whose type changed across Odoo versions (e.g. the
/// tracking flag, a string in old releases and an integer in recent ones).
pub fn deserialize_odoo_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s),
        Value::Bool(true) => Some(String::from("True")),
        other => Some(other.to_string()),
    })
}
