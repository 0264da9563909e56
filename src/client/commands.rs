//! Typed command surface
//!
//! Every method builds the matching [`Command`] and narrows the reply into
//! the requested type, so `client.get::<Option<String>>("key")` reads a
//! possibly missing string and `client.incr("n")` returns the new count.

use std::collections::HashMap;
use std::io::{Read, Write};

use super::{AsyncClient, Client};
use crate::error::Result;
use crate::protocol::{Command, FromResultValue, ToArg};

/// Common commands on top of a single required `query`
pub trait Commands {
    /// Execute a command and narrow the reply
    fn query<T: FromResultValue>(&mut self, command: &Command) -> Result<T>;

    fn ping(&mut self) -> Result<String> {
        self.query(&Command::ping())
    }

    fn echo<T: FromResultValue>(&mut self, message: impl ToArg) -> Result<T> {
        self.query(&Command::echo(message))
    }

    fn get<T: FromResultValue>(&mut self, key: impl ToArg) -> Result<T> {
        self.query(&Command::get(key))
    }

    fn mget<T: FromResultValue, K: ToArg>(&mut self, keys: impl IntoIterator<Item = K>) -> Result<T> {
        self.query(&Command::mget(keys))
    }

    fn set(&mut self, key: impl ToArg, value: impl ToArg) -> Result<String> {
        self.query(&Command::set(key, value))
    }

    /// Returns true if the key was set
    fn setnx(&mut self, key: impl ToArg, value: impl ToArg) -> Result<bool> {
        self.query::<i64>(&Command::setnx(key, value)).map(|n| n == 1)
    }

    fn setex(&mut self, key: impl ToArg, value: impl ToArg, seconds: u64) -> Result<String> {
        self.query(&Command::setex(key, value, seconds))
    }

    /// Returns the number of keys removed
    fn del(&mut self, key: impl ToArg) -> Result<i64> {
        self.query(&Command::del(key))
    }

    fn mdel<K: ToArg>(&mut self, keys: impl IntoIterator<Item = K>) -> Result<i64> {
        self.query(&Command::mdel(keys))
    }

    fn exists(&mut self, key: impl ToArg) -> Result<bool> {
        self.query::<i64>(&Command::exists(key)).map(|n| n > 0)
    }

    fn incr(&mut self, key: impl ToArg) -> Result<i64> {
        self.query(&Command::incr(key))
    }

    fn incrby(&mut self, key: impl ToArg, increment: i64) -> Result<i64> {
        self.query(&Command::incrby(key, increment))
    }

    fn decr(&mut self, key: impl ToArg) -> Result<i64> {
        self.query(&Command::decr(key))
    }

    /// Returns the length of the string after the append
    fn append(&mut self, key: impl ToArg, value: impl ToArg) -> Result<i64> {
        self.query(&Command::append(key, value))
    }

    fn expire(&mut self, key: impl ToArg, seconds: u64) -> Result<bool> {
        self.query::<i64>(&Command::expire(key, seconds)).map(|n| n == 1)
    }

    fn ttl(&mut self, key: impl ToArg) -> Result<i64> {
        self.query(&Command::ttl(key))
    }

    fn keys(&mut self, pattern: impl ToArg) -> Result<Vec<String>> {
        self.query(&Command::keys(pattern))
    }

    fn hset(&mut self, key: impl ToArg, field: impl ToArg, value: impl ToArg) -> Result<i64> {
        self.query(&Command::hset(key, field, value))
    }

    fn hget<T: FromResultValue>(&mut self, key: impl ToArg, field: impl ToArg) -> Result<T> {
        self.query(&Command::hget(key, field))
    }

    fn hgetall(&mut self, key: impl ToArg) -> Result<HashMap<String, String>> {
        self.query(&Command::hgetall(key))
    }

    fn hdel(&mut self, key: impl ToArg, field: impl ToArg) -> Result<i64> {
        self.query(&Command::hdel(key, field))
    }

    fn lpush(&mut self, key: impl ToArg, value: impl ToArg) -> Result<i64> {
        self.query(&Command::lpush(key, value))
    }

    fn rpush(&mut self, key: impl ToArg, value: impl ToArg) -> Result<i64> {
        self.query(&Command::rpush(key, value))
    }

    fn lpop<T: FromResultValue>(&mut self, key: impl ToArg) -> Result<T> {
        self.query(&Command::lpop(key))
    }

    fn rpop<T: FromResultValue>(&mut self, key: impl ToArg) -> Result<T> {
        self.query(&Command::rpop(key))
    }

    fn lrange(&mut self, key: impl ToArg, start: i64, stop: i64) -> Result<Vec<String>> {
        self.query(&Command::lrange(key, start, stop))
    }

    fn llen(&mut self, key: impl ToArg) -> Result<i64> {
        self.query(&Command::llen(key))
    }

    fn sadd(&mut self, key: impl ToArg, member: impl ToArg) -> Result<i64> {
        self.query(&Command::sadd(key, member))
    }

    fn srem(&mut self, key: impl ToArg, member: impl ToArg) -> Result<i64> {
        self.query(&Command::srem(key, member))
    }

    fn smembers(&mut self, key: impl ToArg) -> Result<Vec<String>> {
        self.query(&Command::smembers(key))
    }

    /// Returns the number of subscribers that received the message
    fn publish(&mut self, channel: impl ToArg, message: impl ToArg) -> Result<i64> {
        self.query(&Command::publish(channel, message))
    }

    fn flushdb(&mut self) -> Result<String> {
        self.query(&Command::flushdb())
    }
}

impl<S: Read + Write> Commands for Client<S> {
    fn query<T: FromResultValue>(&mut self, command: &Command) -> Result<T> {
        self.execute_as(command)
    }
}

impl Commands for AsyncClient {
    fn query<T: FromResultValue>(&mut self, command: &Command) -> Result<T> {
        self.execute(command)?.convert()
    }
}
