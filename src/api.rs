use rand::{Rng, thread_rng};
use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Serialize, Debug)]
pub struct RequestParams<T> {
    service: String,
    method: String,
    args: T,
}

#[derive(Serialize, Debug)]
pub struct Request<T> {
    jsonrpc: String,
    method: String,
    id: u32,
    params: RequestParams<T>,
}

/// Error payload sent back by Odoo instead of a `result`.
#[derive(Deserialize, Debug, Clone)]
pub struct Fault {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<FaultData>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FaultData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct Response<T> {
    pub id: Value,
    pub result: Option<T>,
    pub error: Option<Fault>,
}

impl<T> Request<T> {
    pub fn new(service: &str, method: Option<&str>, args: T) -> Request<T> {
        let mut rng = thread_rng();
        Request {
            jsonrpc: String::from("2.0"),
            method: String::from("call"),
            params: RequestParams {
                service: service.to_string(),
                method: method.unwrap_or("execute_kw").to_string(),
                args,
            },
            id: rng.gen_range(1..10000),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl<T> Response<T> {
    /// Unwraps the `result`, turning an Odoo fault into `Error::Rpc`.
    ///
    /// A response with neither `result` nor `error` is a JSON `null` result
    /// and is decoded as such, so `T` may be an `Option`.
    pub fn into_result(self) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Some(fault) = self.error {
            let message = match fault.data {
                Some(data) if !data.message.is_empty() => data.message,
                _ => fault.message,
            };
            return Err(Error::Rpc { code: fault.code, message });
        }
        match self.result {
            Some(result) => Ok(result),
            None => Ok(serde_json::from_value(Value::Null)?),
        }
    }
}
