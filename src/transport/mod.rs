//! Transport layer for gduck transaction streams.
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `messages` - Generated wire message types, client and server stubs
//! - `protocol` - Transport trait and channel configuration
//! - `grpc` - `tonic` transport implementation
//!
//! # Example
//!
//! ```no_run
//! use futures_util::stream::{self, StreamExt};
//! use gduck_client::transport::messages::{connect, Connect, Request};
//! use gduck_client::transport::{ChannelConfig, GrpcTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = GrpcTransport::new(ChannelConfig::default());
//! let connect = Request::from(Connect {
//!     file_name: ":memory:".to_string(),
//!     mode: connect::Mode::ReadWrite as i32,
//! });
//!
//! let mut responses = transport
//!     .open_transaction(&"localhost:50051".parse()?, stream::iter([connect]).boxed())
//!     .await?;
//! while let Some(response) = responses.next().await {
//!     println!("{:?}", response?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod grpc;
pub mod messages;
pub mod protocol;

// Re-export commonly used types
pub use grpc::GrpcTransport;
pub use protocol::{ChannelConfig, RequestStream, ResponseStream, Transport};
