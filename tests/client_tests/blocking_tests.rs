//! Blocking Client Tests
//!
//! These tests verify:
//! - Round trips over an in-memory transport
//! - Pipelines
//! - Failure memory after transport errors
//! - The typed command surface
//! - TCP connect against a loopback listener

#[path = "../common/mod.rs"]
mod common;

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use common::{bulk, bulk_reply, mock_pair};
use resplink::{Client, ClientError, Command, Commands, Config, ParsingFailure, Pipeline, ResultValue};

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_execute_writes_request_and_reads_reply() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"+OK\r\n");
    let reply = client.execute(&Command::set("k", "v")).unwrap();

    assert_eq!(reply, ResultValue::status("OK"));
    assert_eq!(server.written(), b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n");
}

#[test]
fn test_execute_as_converts() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b":42\r\n");
    let n: i64 = client.execute_as(&Command::incr("n")).unwrap();

    assert_eq!(n, 42);
}

#[test]
fn test_error_reply_is_returned_as_value() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"-WRONGTYPE bad\r\n");
    let reply = client.execute(&Command::get("list")).unwrap();

    assert_eq!(reply, ResultValue::Error("WRONGTYPE bad".to_string()));
    assert!(!client.is_broken());
}

#[test]
fn test_reply_split_across_reads() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"$11\r\nhel");
    server.reply(b"lo ");
    server.reply(b"world\r\n");
    let reply = client.execute(&Command::get("greeting")).unwrap();

    assert_eq!(reply, bulk("hello world"));
}

#[test]
fn test_pipeline_returns_replies_in_order() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"+OK\r\n$1\r\nv\r\n:1\r\n");
    let pipeline = Pipeline::new()
        .with(Command::set("k", "v"))
        .with(Command::get("k"))
        .with(Command::del("k"));
    let replies = client.execute_pipeline(&pipeline).unwrap();

    assert_eq!(
        replies,
        vec![ResultValue::status("OK"), bulk("v"), ResultValue::Integer(1)]
    );
    assert_eq!(server.requests().len(), 3);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[test]
fn test_empty_command_does_not_touch_transport() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    let result = client.execute(&Command::default());

    assert!(matches!(result, Err(ClientError::Message(_))));
    assert!(server.written().is_empty());
    assert!(!client.is_broken());
}

#[test]
fn test_io_failure_is_remembered() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.fail(io::ErrorKind::ConnectionReset);
    let first = client.execute(&Command::ping());
    match first {
        Err(ClientError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("Expected IO error, got {:?}", other),
    }
    assert!(client.is_broken());

    // A reply is now available, but the client must not use the stream again
    server.reply(b"+PONG\r\n");
    let written_before = server.written().len();
    match client.execute(&Command::ping()) {
        Err(ClientError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("Expected remembered IO error, got {:?}", other),
    }
    assert_eq!(server.written().len(), written_before);
}

#[test]
fn test_write_failure_is_remembered() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.fail_writes();
    assert!(matches!(client.execute(&Command::ping()), Err(ClientError::Io(_))));
    assert!(client.is_broken());
}

#[test]
fn test_closed_connection_is_io_error() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    drop(server);
    match client.execute(&Command::ping()) {
        Err(ClientError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("Expected IO error, got {:?}", other),
    }
}

#[test]
fn test_parse_failure_does_not_poison() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"!bogus\r\n");
    assert!(matches!(client.execute(&Command::ping()), Err(ClientError::Parse(_))));
    assert!(!client.is_broken());

    server.reply(b"+PONG\r\n");
    assert_eq!(client.execute(&Command::ping()).unwrap(), ResultValue::status("PONG"));
}

#[test]
fn test_bad_array_element_consumes_whole_reply() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"*2\r\n:x\r\n:1\r\n+PONG\r\n");
    assert!(matches!(
        client.execute(&Command::lrange("list", 0, -1)),
        Err(ClientError::Parse(ParsingFailure::InvalidInteger(_)))
    ));
    assert!(!client.is_broken());

    // The leftover `:1` element must not be taken as the PING reply
    assert_eq!(client.execute(&Command::ping()).unwrap(), ResultValue::status("PONG"));
}

#[test]
fn test_bad_pipeline_reply_consumes_the_rest() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"+OK\r\n:x\r\n+OK\r\n+PONG\r\n");
    let pipeline = Pipeline::new()
        .with(Command::set("a", "1"))
        .with(Command::incr("a"))
        .with(Command::set("b", "2"));
    assert!(matches!(
        client.execute_pipeline(&pipeline),
        Err(ClientError::Parse(ParsingFailure::InvalidInteger(_)))
    ));

    assert_eq!(client.execute(&Command::ping()).unwrap(), ResultValue::status("PONG"));
}

#[test]
fn test_lost_framing_is_remembered() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"$3\r\nabcd\r\n+PONG\r\n");
    assert!(matches!(
        client.execute(&Command::get("k")),
        Err(ClientError::Parse(ParsingFailure::MalformedTerminator))
    ));
    assert!(client.is_broken());

    let written_before = server.written().len();
    assert!(matches!(
        client.execute(&Command::ping()),
        Err(ClientError::Parse(ParsingFailure::MalformedTerminator))
    ));
    assert_eq!(server.written().len(), written_before);
}

// =============================================================================
// Typed Commands
// =============================================================================

#[test]
fn test_typed_commands() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"+OK\r\n");
    assert_eq!(client.set("k", "v").unwrap(), "OK");

    server.reply(&bulk_reply("v"));
    assert_eq!(client.get::<String>("k").unwrap(), "v");

    server.reply(b"$-1\r\n");
    assert_eq!(client.get::<Option<String>>("missing").unwrap(), None);

    server.reply(b"*4\r\n$1\r\na\r\n$1\r\n1\r\n$1\r\nb\r\n$1\r\n2\r\n");
    let hash = client.hgetall("h").unwrap();
    assert_eq!(hash.len(), 2);
    assert_eq!(hash["b"], "2");

    server.reply(b":1\r\n");
    assert!(client.exists("k").unwrap());

    server.reply(b"*2\r\n$1\r\nx\r\n$1\r\ny\r\n");
    assert_eq!(client.lrange("list", 0, -1).unwrap(), vec!["x", "y"]);

    let requests = server.requests();
    assert_eq!(requests[0], vec!["SET", "k", "v"]);
    assert_eq!(requests[3], vec!["HGETALL", "h"]);
    assert_eq!(requests[5], vec!["LRANGE", "list", "0", "-1"]);
}

#[test]
fn test_typed_command_on_error_reply() {
    let (transport, server) = mock_pair();
    let mut client = Client::new(transport);

    server.reply(b"-ERR value is not an integer or out of range\r\n");

    assert!(matches!(client.incr("text"), Err(ClientError::Server(_))));
}

// =============================================================================
// TCP
// =============================================================================

#[test]
fn test_connect_over_loopback() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;

        // *1\r\n $4\r\n PING\r\n
        let mut line = String::new();
        for _ in 0..3 {
            line.clear();
            reader.read_line(&mut line).unwrap();
        }
        assert_eq!(line, "PING\r\n");
        writer.write_all(b"+PONG\r\n").unwrap();
    });

    let config = Config::builder().addr(addr.to_string()).build();
    let mut client = Client::connect(&config).unwrap();

    assert_eq!(client.ping().unwrap(), "PONG");
    server.join().unwrap();
}

#[test]
fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::builder()
        .addr(addr.to_string())
        .connect_timeout_ms(500)
        .build();

    assert!(matches!(Client::connect(&config), Err(ClientError::Io(_))));
}
