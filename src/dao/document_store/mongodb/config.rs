use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE: &str = "rebms";

#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DATABASE).to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Read `MONGO_URI` and optional `MONGO_DB`; `Ok(None)` when no URI is set.
    pub async fn from_env() -> MongoResult<Option<Self>> {
        let Ok(uri) = std::env::var("MONGO_URI") else {
            return Ok(None);
        };
        if uri.trim().is_empty() {
            return Err(MongoDaoError::MissingEnvVar { var: "MONGO_URI" });
        }
        let db = std::env::var("MONGO_DB").ok();
        Self::from_uri(&uri, db.as_deref()).await.map(Some)
    }
}
