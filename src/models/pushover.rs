use serde::Deserialize;

/// Reply from the messages endpoint, `status` is 1 on success
#[derive(Deserialize, Debug)]
pub struct MessageResponse {
    pub status: i64,
    pub request: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}
