use actix_web::{http::header, web::Data, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::{
    endpoints::EndpointState,
    logging::RequestLogFields,
    network::{self, AddressRecord, ClientAddress, ClientFormat},
    settings::RenderMode,
    utils::{self, RequestPeer},
};

/// Width of the label column in `Label: value` lines.
pub const LABEL_COLUMN: usize = 28;

pub const NOTHING_ENABLED: &str = "You need to enable at least one section \
     (DEBUG_HTTP, DEBUG_SERVER, DEBUG_CLIENT) for this software to be useful!";

pub struct HttpDetails {
    pub url: String,
    pub host: String,
    pub listen_port: String,
    pub referer: String,
    pub user_agent: String,
}

pub struct ServerDetails {
    pub hostname: String,
    pub addresses: Vec<AddressRecord>,
}

/// Everything gathered for one response, rendered as aligned plain text.
pub struct Report<'a> {
    pub mode: RenderMode,
    pub timestamp: i64,
    pub http: Option<HttpDetails>,
    pub server: Option<ServerDetails>,
    pub client: Option<&'a ClientAddress>,
}

struct TextWriter {
    body: String,
    mode: RenderMode,
    sections: usize,
}

impl TextWriter {
    fn new(mode: RenderMode) -> Self {
        Self {
            body: String::new(),
            mode,
            sections: 0,
        }
    }

    fn kv(&mut self, key: &str, value: &str) {
        self.body.push_str(&utils::pad_right(LABEL_COLUMN, key));
        self.body.push_str(": ");
        self.body.push_str(value);
        self.body.push('\n');
    }

    fn spacer(&mut self) {
        self.body.push('\n');
    }

    fn begin_section(&mut self) {
        if self.mode == RenderMode::Compact && self.sections > 0 {
            self.spacer();
        }
        self.sections += 1;
    }

    fn end_section(&mut self) {
        if self.mode == RenderMode::Full {
            self.spacer();
        }
    }
}

impl Report<'_> {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.server.is_none() && self.client.is_none()
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return format!("{}\n", NOTHING_ENABLED);
        }

        let mut out = TextWriter::new(self.mode);

        if self.mode == RenderMode::Full {
            out.kv("Timestamp", &self.timestamp.to_string());
            out.spacer();
        }

        if let Some(http) = &self.http {
            out.begin_section();
            out.kv("HTTP URL", &http.url);
            out.kv("HTTP Host", &http.host);
            out.kv("HTTP Listen port", &http.listen_port);
            out.kv("HTTP Referer", &http.referer);
            out.kv("HTTP User agent", &http.user_agent);
            out.end_section();
        }

        if let Some(server) = &self.server {
            out.begin_section();
            out.kv("Server hostname", &server.hostname);
            for addr in &server.addresses {
                out.kv("Server's address", &addr.display());
            }
            out.end_section();
        }

        if let Some(client) = self.client {
            let format = match self.mode {
                RenderMode::Full => ClientFormat::Long,
                RenderMode::Compact => ClientFormat::Short,
            };
            out.begin_section();
            out.kv("Client's IP", &client.render(format));
            out.end_section();
        }

        out.body
    }
}

/// Echo back what the server knows about this request, itself and the client.
///
/// Always answers 200: failed lookups only degrade the output.
pub async fn report(req: HttpRequest, state: Data<EndpointState>) -> HttpResponse {
    let settings = &state.settings;
    let toggles = settings.toggles;
    let introspector = state.introspector();

    let host = req.requested_host();
    let url = req.uri().to_string();
    let client = introspector.resolve_client(&req.remote_addr()).await;

    let http = if toggles.http {
        Some(HttpDetails {
            url: url.clone(),
            host: host.clone(),
            listen_port: settings.http_port.clone(),
            referer: req.header_str(header::REFERER),
            user_agent: req.header_str(header::USER_AGENT),
        })
    } else {
        None
    };

    let server = if toggles.server {
        Some(ServerDetails {
            hostname: network::server_hostname(),
            addresses: introspector.local_addresses().await,
        })
    } else {
        None
    };

    let body = Report {
        mode: settings.render_mode,
        timestamp: Utc::now().timestamp(),
        http,
        server,
        client: if toggles.client { Some(&client) } else { None },
    }
    .render();

    let fields = RequestLogFields {
        method: req.method().to_string(),
        url: format!("http://{}{}", host, url),
        client: client.render(ClientFormat::Short),
        agent: Some(req.header_str(header::USER_AGENT)).filter(|agent| !agent.is_empty()),
    };
    slog::info!(state.log.log, "Handled request"; fields);

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(body)
}
