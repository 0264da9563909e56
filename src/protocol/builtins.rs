//! Constructors for common commands
//!
//! Commands that accept one or many keys come in pairs: the plain name for a
//! single key and an `m`-prefixed variant for several.

use super::command::{Command, ToArg};

macro_rules! builtin_commands {
    ($(
        $(#[$doc:meta])*
        fn $func:ident($($arg:ident: $ty:ident),*) => $name:literal;
    )*) => {
        impl Command {
            $(
                $(#[$doc])*
                pub fn $func<$($ty: ToArg),*>($($arg: $ty),*) -> Command {
                    Command::new($name)$(.arg($arg))*
                }
            )*
        }
    };
}

builtin_commands! {
    /// PING
    fn ping() => "PING";
    /// ECHO message
    fn echo(message: M) => "ECHO";
    /// GET key
    fn get(key: K) => "GET";
    /// SET key value
    fn set(key: K, value: V) => "SET";
    /// SETNX key value
    fn setnx(key: K, value: V) => "SETNX";
    /// DEL key
    fn del(key: K) => "DEL";
    /// EXISTS key
    fn exists(key: K) => "EXISTS";
    /// INCR key
    fn incr(key: K) => "INCR";
    /// INCRBY key increment
    fn incrby(key: K, increment: I) => "INCRBY";
    /// DECR key
    fn decr(key: K) => "DECR";
    /// APPEND key value
    fn append(key: K, value: V) => "APPEND";
    /// EXPIRE key seconds
    fn expire(key: K, seconds: S) => "EXPIRE";
    /// TTL key
    fn ttl(key: K) => "TTL";
    /// KEYS pattern
    fn keys(pattern: P) => "KEYS";
    /// HSET key field value
    fn hset(key: K, field: F, value: V) => "HSET";
    /// HGET key field
    fn hget(key: K, field: F) => "HGET";
    /// HGETALL key
    fn hgetall(key: K) => "HGETALL";
    /// HDEL key field
    fn hdel(key: K, field: F) => "HDEL";
    /// LPUSH key value
    fn lpush(key: K, value: V) => "LPUSH";
    /// RPUSH key value
    fn rpush(key: K, value: V) => "RPUSH";
    /// LPOP key
    fn lpop(key: K) => "LPOP";
    /// RPOP key
    fn rpop(key: K) => "RPOP";
    /// LRANGE key start stop
    fn lrange(key: K, start: S, stop: E) => "LRANGE";
    /// LLEN key
    fn llen(key: K) => "LLEN";
    /// SADD key member
    fn sadd(key: K, member: M) => "SADD";
    /// SREM key member
    fn srem(key: K, member: M) => "SREM";
    /// SMEMBERS key
    fn smembers(key: K) => "SMEMBERS";
    /// PUBLISH channel message
    fn publish(channel: C, message: M) => "PUBLISH";
    /// FLUSHDB
    fn flushdb() => "FLUSHDB";
}

impl Command {
    /// SET key value EX seconds
    pub fn setex<K: ToArg, V: ToArg>(key: K, value: V, seconds: u64) -> Command {
        Command::new("SET").arg(key).arg(value).arg("EX").arg(seconds)
    }

    /// DEL key [key ...]
    pub fn mdel<I, K>(keys: I) -> Command
    where
        I: IntoIterator<Item = K>,
        K: ToArg,
    {
        Command::new("DEL").args(keys)
    }

    /// MGET key [key ...]
    pub fn mget<I, K>(keys: I) -> Command
    where
        I: IntoIterator<Item = K>,
        K: ToArg,
    {
        Command::new("MGET").args(keys)
    }

    /// HSET key field value [field value ...]
    pub fn mhset<I, F, V>(key: impl ToArg, pairs: I) -> Command
    where
        I: IntoIterator<Item = (F, V)>,
        F: ToArg,
        V: ToArg,
    {
        Command::new("HSET").arg(key).arg_pairs(pairs)
    }

    /// RPUSH key value [value ...]
    pub fn mrpush<I, V>(key: impl ToArg, values: I) -> Command
    where
        I: IntoIterator<Item = V>,
        V: ToArg,
    {
        Command::new("RPUSH").arg(key).args(values)
    }
}
