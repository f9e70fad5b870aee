use tokio_tungstenite::{
    MaybeTlsStream,
    WebSocketStream,
    tungstenite::Message
};
use tokio::net::TcpStream;
use futures::stream::{SplitSink, SplitStream};

pub type WebSocketConnection = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

pub(crate) type WebSocketReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
