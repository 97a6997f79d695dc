// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{convert::Infallible, error::Error, net::IpAddr, sync::Arc};

use diesel::Connection;
use hyper::{Method, Response, StatusCode, service::service_fn};
use hyper_util::rt::{TokioExecutor, TokioIo};
use juniper::{EmptySubscription, RootNode};
use juniper_hyper::{graphiql, graphql, playground};
use tokio::net::TcpListener;

use hostonhome_api::{
    challenges::{ChallengeCatalog, reconcile},
    config::Config,
    db::{self, MemoryStore, PgStore, Store},
    graphql::{BaseContext, Context, Mutation, Query, Schema, auth},
};

fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_loopback(),
        IpAddr::V6(ipv6) => ipv6.is_unique_local() || ipv6.is_loopback(),
    }
}

/// The first public address in `X-Forwarded-For`, if the peer is a private proxy.
fn client_ip(remote_ip: IpAddr, forwarded_for: Option<&str>) -> IpAddr {
    if !is_private(&remote_ip) {
        return remote_ip;
    }
    forwarded_for
        .into_iter()
        .flat_map(|xff| xff.split(','))
        .filter_map(|ip_str| ip_str.trim().parse::<IpAddr>().ok())
        .find(|ip| !is_private(ip))
        .unwrap_or(remote_ip)
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>, Box<dyn Error + Send + Sync>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL is not set; verifications are kept in memory only!");
        return Ok(Arc::new(MemoryStore::new()));
    };
    {
        let mut pg_connection = diesel::pg::PgConnection::establish(database_url)?;
        db::run_migrations(&mut pg_connection)?;
    }
    Ok(Arc::new(PgStore::connect(database_url).await?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let catalog = Arc::new(match &config.challenge_catalog_file {
        Some(path) => ChallengeCatalog::from_json_file(path)?,
        None => ChallengeCatalog::builtin(),
    });
    tracing::info!("Loaded {} challenge(s)", catalog.definitions().len());

    let verifying_key = match &config.auth_public_key_file {
        Some(path) => Some(auth::load_verifying_key(path)?),
        None => {
            tracing::warn!(
                "AUTH_PUBLIC_KEY_FILE is not set; all requests will be treated as anonymous!"
            );
            None
        }
    };

    let store = open_store(&config).await?;

    if let Some(interval) = config.reconcile_interval {
        tracing::info!("Reconciling all users every {}s", interval.as_secs());
        tokio::spawn(reconcile::run_periodic(
            store.clone(),
            catalog.clone(),
            interval,
        ));
    }

    let root_node: Arc<Schema> = Arc::new(RootNode::new(Query, Mutation, EmptySubscription::new()));

    let ctx = BaseContext {
        store,
        catalog,
        verifying_key,
        strict_status_updates: config.strict_status_updates,
    };

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on http://{}", config.listen_addr);
    loop {
        let (stream, remote_addr) = listener.accept().await?;

        let io = TokioIo::new(stream);

        let root_node = root_node.clone();
        let ctx = ctx.clone();

        tokio::spawn(async move {
            if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection(
                    io,
                    service_fn(move |req| {
                        let root_node = root_node.clone();

                        let remote_ip = client_ip(
                            remote_addr.ip(),
                            req.headers()
                                .get("x-forwarded-for")
                                .and_then(|xff| xff.to_str().ok()),
                        );

                        let user_details = Context::authenticate(
                            &ctx,
                            req.headers()
                                .get("authorization")
                                .and_then(|auth_header| auth_header.to_str().ok()),
                        );

                        let ctx = Context::new(ctx.clone(), remote_ip, user_details);

                        async {
                            Ok::<_, Infallible>(match (req.method(), req.uri().path()) {
                                (&Method::GET, "/graphql") | (&Method::POST, "/graphql") => {
                                    graphql(root_node, Arc::new(ctx), req).await
                                }
                                (&Method::OPTIONS, "/graphql") => {
                                    let mut resp = Response::new(String::new());
                                    *resp.status_mut() = StatusCode::NO_CONTENT;
                                    resp
                                }
                                (&Method::GET, "/graphiql") => graphiql("/graphql", None).await,
                                (&Method::GET, "/playground") => playground("/graphql", None).await,
                                _ => {
                                    let mut resp = Response::new(String::new());
                                    *resp.status_mut() = StatusCode::NOT_FOUND;
                                    resp
                                }
                            })
                        }
                    }),
                )
                .await
            {
                tracing::error!("Error serving connection: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_behind_proxy() {
        let proxy = IpAddr::from([10, 0, 0, 2]);
        let client = IpAddr::from([203, 0, 113, 7]);
        assert_eq!(client_ip(proxy, Some("192.168.1.5, 203.0.113.7")), client);
        assert_eq!(client_ip(proxy, Some("garbage")), proxy);
        assert_eq!(client_ip(proxy, None), proxy);
    }

    #[test]
    fn test_public_peer_ignores_forwarded_for() {
        let peer = IpAddr::from([198, 51, 100, 1]);
        assert_eq!(client_ip(peer, Some("203.0.113.7")), peer);
    }
}
