//! Redis-backed store
//!
//! Uses plain Redis data structures so that workers written in any language
//! can read jobs back:
//! - `{prefix}:job:{id}` - hash with the job record and current state name
//! - `{prefix}:job-state:{id}` - hash with the state data
//! - `{prefix}:queues` - set of queue names
//! - `{prefix}:queue:{name}` - list of job ids, newest at the head

use super::{ConnectionProvider, StoreConnection, Write};
use crate::config::StorageOptions;
use crate::errors::StoreError;
use redis::Commands;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Hands out Redis connections.
#[derive(Clone)]
pub struct RedisProvider {
    client: redis::Client,
}

impl RedisProvider {
    /// Create a provider for the given URL (e.g., "redis://127.0.0.1:6379").
    ///
    /// No connection is made until one is requested.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    /// Create a provider from [`StorageOptions::redis_url`].
    pub fn from_options(options: &StorageOptions) -> Result<Self, StoreError> {
        Self::open(&options.redis_url)
    }
}

impl fmt::Debug for RedisProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisProvider")
            .field("addr", &self.client.get_connection_info().addr)
            .finish()
    }
}

impl ConnectionProvider for RedisProvider {
    type Connection = RedisConnection;

    fn get_connection(&self) -> Result<RedisConnection, StoreError> {
        Ok(RedisConnection {
            connection: self.client.get_connection()?,
        })
    }
}

/// A single Redis connection. Closed on drop.
pub struct RedisConnection {
    connection: redis::Connection,
}

impl fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnection").finish_non_exhaustive()
    }
}

impl StoreConnection for RedisConnection {
    fn commit_if_absent(&mut self, guard_key: &str, writes: &[Write]) -> Result<bool, StoreError> {
        // WATCH the guard key so a concurrent writer aborts our EXEC, then
        // re-check it on the retry.
        let created = redis::transaction(&mut self.connection, &[guard_key], |conn, pipe| {
            let exists: bool = conn.exists(guard_key)?;
            if exists {
                return Ok(Some(false));
            }

            for write in writes {
                match write {
                    Write::SetHash { key, fields } => {
                        pipe.hset_multiple(key, fields).ignore();
                    }
                    Write::AddToSet { key, member } => {
                        pipe.sadd(key, member).ignore();
                    }
                    Write::PushList { key, value } => {
                        pipe.lpush(key, value).ignore();
                    }
                }
            }

            let reply: Option<()> = pipe.query(conn)?;
            Ok(reply.map(|()| true))
        })?;

        Ok(created)
    }

    fn get_hash(&mut self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self.connection.hgetall(key)?)
    }

    fn get_list(&mut self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.connection.lrange(key, 0, -1)?)
    }

    fn get_set(&mut self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.connection.smembers(key)?)
    }
}
