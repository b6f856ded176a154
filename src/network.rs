//! Reverse-DNS enrichment of the server's own addresses and of the client
//! address.

use futures::future::{self, FutureExt, LocalBoxFuture};
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};
use std::{
    net::{IpAddr, Ipv6Addr},
    sync::Arc,
    time::Duration,
};

use crate::{errors::ReporterError, utils};

/// Upper bound for a single reverse lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_millis(100);

/// Column width for addresses; a fully expanded IPv6 address is 39 characters.
pub const ADDRESS_COLUMN: usize = 39;

/// Something that can turn an IP address into host names.
pub trait ReverseLookup: Send + Sync {
    fn lookup_addr(&self, ip: IpAddr) -> LocalBoxFuture<'_, Result<Vec<String>, ReporterError>>;
}

/// PTR lookups through the system's configured name servers.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    /// Read the system resolver configuration, falling back to the resolver
    /// library defaults if that isn't possible.
    pub fn new(log: &slog::Logger) -> Self {
        let (config, opts) = system_conf::read_system_conf().unwrap_or_else(|err| {
            slog::warn!(log, "Could not read system resolver config, using defaults: {}", err);
            (ResolverConfig::default(), ResolverOpts::default())
        });
        Self {
            resolver: TokioAsyncResolver::tokio(config, resolver_opts(opts)),
        }
    }
}

/// Answers must never be shared between requests, so the resolver's own
/// cache is switched off.
fn resolver_opts(mut opts: ResolverOpts) -> ResolverOpts {
    opts.cache_size = 0;
    opts
}

impl ReverseLookup for SystemResolver {
    fn lookup_addr(&self, ip: IpAddr) -> LocalBoxFuture<'_, Result<Vec<String>, ReporterError>> {
        async move {
            let lookup = self.resolver.reverse_lookup(ip).await?;
            Ok(lookup.iter().map(|name| name.to_string()).collect())
        }
        .boxed_local()
    }
}

/// An address of this host together with the names it resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressRecord {
    pub ip: IpAddr,
    pub hostnames: Vec<String>,
}

impl AddressRecord {
    pub fn display(&self) -> String {
        format!(
            "{} {}",
            utils::pad_right(ADDRESS_COLUMN, &expanded(&self.ip)),
            self.hostnames.join(", ")
        )
    }
}

/// How a client address gets written out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientFormat {
    /// `1.2.3.4 (host.example.)`
    Short,
    /// Address in a padded column, then the names.
    Long,
}

/// What could be learned about the client from its remote address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientAddress {
    /// The remote address was not a `host:port` pair.
    Unknown,
    /// The host part, when reverse resolution failed.
    Bare(String),
    Resolved(IpAddr, Vec<String>),
}

impl ClientAddress {
    pub fn render(&self, format: ClientFormat) -> String {
        match (self, format) {
            (ClientAddress::Unknown, _) => "unknown".to_owned(),
            (ClientAddress::Bare(host), ClientFormat::Short) => host.clone(),
            (ClientAddress::Bare(host), ClientFormat::Long) => {
                utils::pad_right(ADDRESS_COLUMN, host)
            }
            (ClientAddress::Resolved(ip, names), ClientFormat::Short) => {
                format!("{} ({})", ip, names.join(", "))
            }
            (ClientAddress::Resolved(ip, names), ClientFormat::Long) => format!(
                "{} {}",
                utils::pad_right(ADDRESS_COLUMN, &ip.to_string()),
                names.join(", ")
            ),
        }
    }
}

/// Zero-padded form of an address. IPv4 is unchanged; IPv6 is written as
/// eight groups of four hex digits.
pub fn expanded(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => expanded_v6(v6),
    }
}

fn expanded_v6(ip: &Ipv6Addr) -> String {
    ip.segments()
        .iter()
        .map(|segment| format!("{:04x}", segment))
        .collect::<Vec<_>>()
        .join(":")
}

/// Loopback and link-local unicast addresses never show up in the listing.
pub fn is_reportable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => !v4.is_loopback() && !v4.is_link_local(),
        IpAddr::V6(v6) => !v6.is_loopback() && !v6.is_unicast_link_local(),
    }
}

pub fn server_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Runs bounded reverse lookups on behalf of one request.
#[derive(Clone)]
pub struct Introspector {
    resolver: Arc<dyn ReverseLookup>,
    log: slog::Logger,
    timeout: Duration,
}

impl Introspector {
    pub fn new(resolver: Arc<dyn ReverseLookup>, log: slog::Logger) -> Self {
        Self {
            resolver,
            log,
            timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Reverse lookup of `ip`, giving up after the lookup timeout. An empty
    /// answer counts as a failure.
    pub async fn lookup(&self, ip: IpAddr) -> Result<Vec<String>, ReporterError> {
        let names = actix_rt::time::timeout(self.timeout, self.resolver.lookup_addr(ip))
            .await
            .map_err(|_| {
                ReporterError::new(format!(
                    "reverse lookup of {} timed out after {:?}",
                    ip, self.timeout
                ))
            })??;
        if names.is_empty() {
            return Err(ReporterError::new(format!("no names found for {}", ip)));
        }
        Ok(names)
    }

    /// Resolve every reportable interface address of this host. Addresses
    /// whose lookup fails are logged and left out.
    pub async fn local_addresses(&self) -> Vec<AddressRecord> {
        match if_addrs::get_if_addrs() {
            Ok(interfaces) => {
                self.resolve_addresses(interfaces.iter().map(|iface| iface.ip()))
                    .await
            }
            Err(err) => {
                slog::warn!(self.log, "Could not list network interfaces: {}", err);
                Vec::new()
            }
        }
    }

    /// Filter and resolve a list of addresses. Lookups run concurrently, the
    /// output keeps the input order.
    pub async fn resolve_addresses<I>(&self, addrs: I) -> Vec<AddressRecord>
    where
        I: IntoIterator<Item = IpAddr>,
    {
        let lookups = addrs
            .into_iter()
            .filter(is_reportable)
            .map(|ip| self.lookup(ip).map(move |res| (ip, res)));

        future::join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(ip, res)| match res {
                Ok(hostnames) => Some(AddressRecord { ip, hostnames }),
                Err(err) => {
                    slog::warn!(self.log, "Skipping local address {}: {}", ip, err);
                    None
                }
            })
            .collect()
    }

    /// Work out who `remote_addr` (a `host:port` pair) is.
    pub async fn resolve_client(&self, remote_addr: &str) -> ClientAddress {
        let host = match utils::split_host_port(remote_addr) {
            Some(host) => host,
            None => return ClientAddress::Unknown,
        };

        let ip: IpAddr = match host.parse() {
            Ok(ip) => ip,
            Err(_) => return ClientAddress::Bare(host.to_owned()),
        };

        match self.lookup(ip).await {
            Ok(names) => ClientAddress::Resolved(ip, names),
            Err(err) => {
                slog::debug!(self.log, "Client lookup failed: {}", err);
                ClientAddress::Bare(host.to_owned())
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::{collections::HashMap, net::Ipv4Addr, time::Instant};

    /// Answers from a fixed table; anything else is an error.
    pub struct StaticResolver {
        pub names: HashMap<IpAddr, Vec<String>>,
    }

    impl StaticResolver {
        pub fn new(entries: &[(&str, &[&str])]) -> Self {
            let names: HashMap<IpAddr, Vec<String>> = entries
                .iter()
                .map(|(ip, names)| {
                    (
                        ip.parse().unwrap(),
                        names.iter().map(|n| n.to_string()).collect(),
                    )
                })
                .collect();
            Self { names }
        }
    }

    impl ReverseLookup for StaticResolver {
        fn lookup_addr(
            &self,
            ip: IpAddr,
        ) -> LocalBoxFuture<'_, Result<Vec<String>, ReporterError>> {
            let res = self
                .names
                .get(&ip)
                .cloned()
                .ok_or_else(|| ReporterError::new(format!("NXDOMAIN for {}", ip)));
            future::ready(res).boxed_local()
        }
    }

    /// Never answers in time.
    pub struct SlowResolver;

    impl ReverseLookup for SlowResolver {
        fn lookup_addr(
            &self,
            _ip: IpAddr,
        ) -> LocalBoxFuture<'_, Result<Vec<String>, ReporterError>> {
            async {
                actix_rt::time::sleep(Duration::from_secs(10)).await;
                Ok(vec!["too-late.example.".to_owned()])
            }
            .boxed_local()
        }
    }

    fn introspector(resolver: impl ReverseLookup + 'static) -> Introspector {
        Introspector::new(
            Arc::new(resolver),
            slog::Logger::root(slog::Discard, slog::o!()),
        )
    }

    #[test]
    fn resolver_does_not_cache() {
        assert_eq!(resolver_opts(ResolverOpts::default()).cache_size, 0);

        let mut opts = ResolverOpts::default();
        opts.cache_size = 512;
        opts.ndots = 3;
        let opts = resolver_opts(opts);
        assert_eq!(opts.cache_size, 0);
        assert_eq!(opts.ndots, 3, "other system options are kept");
    }

    #[test]
    fn expanded_addresses() {
        assert_eq!(
            expanded(&"2001:db8::1".parse().unwrap()),
            "2001:0db8:0000:0000:0000:0000:0000:0001"
        );
        assert_eq!(expanded(&"2001:db8::1".parse().unwrap()).len(), ADDRESS_COLUMN);
        assert_eq!(expanded(&"10.0.0.1".parse().unwrap()), "10.0.0.1");
    }

    #[test]
    fn loopback_and_link_local_are_not_reportable() {
        for ip in &["127.0.0.1", "127.1.2.3", "::1", "169.254.10.20", "fe80::1"] {
            assert!(!is_reportable(&ip.parse().unwrap()), "{} is reportable", ip);
        }
        for ip in &["10.0.0.1", "192.168.1.5", "2001:db8::1", "fd00::1"] {
            assert!(is_reportable(&ip.parse().unwrap()), "{} is not reportable", ip);
        }
    }

    #[test]
    fn record_display_pads_address_column() {
        let record = AddressRecord {
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            hostnames: vec!["a.example.".to_owned(), "b.example.".to_owned()],
        };
        let display = record.display();
        assert_eq!(&display[..ADDRESS_COLUMN], &pad(39, "10.0.0.1"));
        assert_eq!(&display[ADDRESS_COLUMN..], " a.example., b.example.");
    }

    fn pad(width: usize, text: &str) -> String {
        utils::pad_right(width, text)
    }

    #[test]
    fn client_render_forms() {
        let ip: IpAddr = "192.0.2.7".parse().unwrap();
        let resolved = ClientAddress::Resolved(ip, vec!["h1.".to_owned(), "h2.".to_owned()]);
        assert_eq!(resolved.render(ClientFormat::Short), "192.0.2.7 (h1., h2.)");
        assert_eq!(
            resolved.render(ClientFormat::Long),
            format!("{} h1., h2.", pad(39, "192.0.2.7"))
        );

        let bare = ClientAddress::Bare("192.0.2.7".to_owned());
        assert_eq!(bare.render(ClientFormat::Short), "192.0.2.7");
        assert_eq!(bare.render(ClientFormat::Long), pad(39, "192.0.2.7"));

        assert_eq!(ClientAddress::Unknown.render(ClientFormat::Short), "unknown");
        assert_eq!(ClientAddress::Unknown.render(ClientFormat::Long), "unknown");
    }

    #[actix_rt::test]
    async fn resolve_client_unsplittable_is_unknown() {
        let intro = introspector(StaticResolver::new(&[]));
        assert_eq!(intro.resolve_client("").await, ClientAddress::Unknown);
        assert_eq!(
            intro
                .resolve_client("1.2.3.4")
                .await
                .render(ClientFormat::Long),
            "unknown"
        );
    }

    #[actix_rt::test]
    async fn resolve_client_with_names() {
        let intro = introspector(StaticResolver::new(&[("::1", &["localhost."])]));
        assert_eq!(
            intro
                .resolve_client("[::1]:5000")
                .await
                .render(ClientFormat::Short),
            "::1 (localhost.)"
        );
    }

    #[actix_rt::test]
    async fn resolve_client_lookup_failure_is_bare() {
        let intro = introspector(StaticResolver::new(&[]));
        assert_eq!(
            intro.resolve_client("198.51.100.1:80").await,
            ClientAddress::Bare("198.51.100.1".to_owned())
        );
    }

    #[actix_rt::test]
    async fn resolve_client_non_ip_host_is_bare() {
        let intro = introspector(StaticResolver::new(&[]));
        assert_eq!(
            intro.resolve_client("not-an-ip:80").await,
            ClientAddress::Bare("not-an-ip".to_owned())
        );
    }

    #[actix_rt::test]
    async fn slow_lookup_times_out() {
        let intro = introspector(SlowResolver);
        let started = Instant::now();
        let client = intro.resolve_client("203.0.113.9:1234").await;
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "lookup should give up after the timeout"
        );
        assert_eq!(client, ClientAddress::Bare("203.0.113.9".to_owned()));
    }

    #[actix_rt::test]
    async fn empty_answer_is_a_failure() {
        let intro = introspector(StaticResolver::new(&[("192.0.2.1", &[])]));
        assert!(intro.lookup("192.0.2.1".parse().unwrap()).await.is_err());
    }

    #[actix_rt::test]
    async fn resolve_addresses_filters_and_skips_failures() {
        let intro = introspector(StaticResolver::new(&[
            ("127.0.0.1", &["localhost."]),
            ("fe80::1", &["link.example."]),
            ("10.0.0.2", &["ten.example."]),
            ("2001:db8::2", &["six.example.", "alias.example."]),
        ]));
        let addrs: Vec<IpAddr> = [
            "127.0.0.1",
            "::1",
            "fe80::1",
            "169.254.0.9",
            "2001:db8::2",
            "192.0.2.200",
            "10.0.0.2",
        ]
        .iter()
        .map(|ip| ip.parse().unwrap())
        .collect();

        let records = intro.resolve_addresses(addrs).await;
        assert_eq!(
            records,
            vec![
                AddressRecord {
                    ip: "2001:db8::2".parse().unwrap(),
                    hostnames: vec!["six.example.".to_owned(), "alias.example.".to_owned()],
                },
                AddressRecord {
                    ip: "10.0.0.2".parse().unwrap(),
                    hostnames: vec!["ten.example.".to_owned()],
                },
            ]
        );
    }
}
