//! A small server configuration model and its property tables.
use std::net::IpAddr;

use digester_rs::core::introspect::{Introspector, IntrospectorBuilder, PropertyTableBuilder};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Server {
    pub port: i32,
    pub shutdown: String,
    pub services: Vec<Service>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Connector {
    pub port: u16,
    pub protocol: String,
    pub secure: bool,
    pub connection_timeout: u64,
    pub compression_ratio: f32,
    pub separator: char,
    pub address: Option<IpAddr>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NioConnector {
    pub port: u16,
    pub poller_threads: usize,
}

pub fn introspector() -> Introspector {
    IntrospectorBuilder::new()
        .table(
            PropertyTableBuilder::<Server>::new()
                .property("port", |s: &mut Server, v: i32| s.port = v)
                .property("shutdown", |s: &mut Server, v: String| s.shutdown = v)
                .build(),
        )
        .table(
            PropertyTableBuilder::<Service>::new()
                .property("name", |s: &mut Service, v: String| s.name = v)
                .build(),
        )
        .table(
            PropertyTableBuilder::<Connector>::new()
                .property("port", |c: &mut Connector, v: u16| c.port = v)
                .property("protocol", |c: &mut Connector, v: String| c.protocol = v)
                .property("secure", |c: &mut Connector, v: bool| c.secure = v)
                .try_property("connectionTimeout", |c: &mut Connector, v: u64| {
                    if v == 0 {
                        return Err("connection timeout must be positive");
                    }
                    c.connection_timeout = v;
                    Ok(())
                })
                .property("compressionRatio", |c: &mut Connector, v: f32| {
                    c.compression_ratio = v
                })
                .property("separator", |c: &mut Connector, v: char| c.separator = v)
                .parsed_property("address", |c: &mut Connector, v: IpAddr| {
                    c.address = Some(v)
                })
                .build(),
        )
        .table(
            PropertyTableBuilder::<NioConnector>::new()
                .property("port", |c: &mut NioConnector, v: u16| c.port = v)
                .property("pollerThreads", |c: &mut NioConnector, v: usize| {
                    c.poller_threads = v
                })
                .build(),
        )
        .build()
}
