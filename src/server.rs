use crate::config::BrokerConfig;
use crate::controller::{self, SharedStore};
use crate::error;
use crate::message_handler::MessageHandler;
use hyper::service::{make_service_fn, service_fn};
use hyper::Method;
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

pub const SEND_PATH: &str = "/messages/send";
pub const RECEIVE_PATH: &str = "/messages/receive";

async fn router(
    req: Request<Body>,
    store: SharedStore,
    max_body_bytes: usize,
) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, SEND_PATH) => controller::send_handler(req, store, max_body_bytes).await,
        (&Method::GET, RECEIVE_PATH) => controller::receive_handler(store).await,
        _ => {
            let mut not_found = Response::default();
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    }
}

/// Returns the bound address and the server future, which resolves once
/// `shutdown` does.
pub fn serve(
    cfg: &BrokerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> error::Result<(SocketAddr, impl Future<Output = error::Result<()>>)> {
    let store: SharedStore = Arc::new(MessageHandler::new(&cfg.store_path));
    serve_store(cfg.addr, store, cfg.max_body_bytes, shutdown)
}

pub fn serve_store(
    addr: SocketAddr,
    store: SharedStore,
    max_body_bytes: usize,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> error::Result<(SocketAddr, impl Future<Output = error::Result<()>>)> {
    let make_svc = make_service_fn(move |_conn| {
        let store = Arc::clone(&store);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                router(req, Arc::clone(&store), max_body_bytes)
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    let server = server.with_graceful_shutdown(shutdown);

    Ok((local_addr, async move {
        server.await?;
        Ok(())
    }))
}
