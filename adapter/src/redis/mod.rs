use ::redis::{aio::MultiplexedConnection, Client};
use shared::{config::RedisConfig, error::AppResult};

pub mod model;

use model::{RedisKey, RedisValue};

pub struct RedisClient {
    client: Client,
}

impl RedisClient {
    pub fn new(config: &RedisConfig) -> AppResult<Self> {
        let client = Client::open(format!("redis://{}:{}", config.host, config.port))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    pub async fn set_ex<T: RedisKey>(&self, key: &T, value: &T::Value, ttl: u64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        ::redis::cmd("SET")
            .arg(key.inner())
            .arg(value.inner())
            .arg("EX")
            .arg(ttl)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn get<T: RedisKey>(&self, key: &T) -> AppResult<Option<T::Value>> {
        let mut conn = self.connection().await?;
        let result: Option<String> = ::redis::cmd("GET")
            .arg(key.inner())
            .query_async(&mut conn)
            .await?;
        result
            .map(<T::Value as TryFrom<String>>::try_from)
            .transpose()
    }

    pub async fn delete<T: RedisKey>(&self, key: &T) -> AppResult<()> {
        let mut conn = self.connection().await?;
        ::redis::cmd("DEL")
            .arg(key.inner())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn try_connect(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        ::redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(())
    }
}
