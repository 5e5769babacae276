//! Sink construction from configuration

use std::sync::Arc;
use std::time::Duration;

use courier_config::SinksConfig;
use courier_sinks::{
    ContainerMetricSink, DumpSink, FrameWriter, SyslogSink, SyslogWriter, TcpSyslogWriter,
    WebsocketSink,
};

/// Builds sinks sized and timed by [`SinksConfig`]
///
/// Live sinks spawn their writer tasks, so those constructors must run
/// within a tokio runtime.
#[derive(Debug, Clone)]
pub struct SinkFactory {
    config: SinksConfig,
    hostname: String,
}

impl SinkFactory {
    /// `hostname` fills the HOSTNAME field of relayed syslog messages
    pub fn new(config: SinksConfig, hostname: impl Into<String>) -> Self {
        Self {
            config,
            hostname: hostname.into(),
        }
    }

    pub fn config(&self) -> &SinksConfig {
        &self.config
    }

    /// How long a dump sink may go without envelopes before it is reaped
    pub fn dump_inactivity_timeout(&self) -> Duration {
        self.config.dump.inactivity_timeout
    }

    pub fn websocket<W: FrameWriter>(
        &self,
        id: impl Into<String>,
        app_id: Option<String>,
        writer: W,
    ) -> Arc<WebsocketSink> {
        WebsocketSink::spawn(id, app_id, writer, self.config.websocket.buffer_size)
    }

    pub fn dump(&self, id: impl Into<String>, app_id: impl Into<String>) -> Arc<DumpSink> {
        Arc::new(DumpSink::new(id, app_id, self.config.dump.capacity))
    }

    pub fn container_metric(
        &self,
        id: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Arc<ContainerMetricSink> {
        Arc::new(ContainerMetricSink::new(
            id,
            app_id,
            self.config.container_metric.freshness_window,
        ))
    }

    /// Syslog sink relaying over TCP to `target` (`host:port`)
    pub fn syslog(
        &self,
        id: impl Into<String>,
        app_id: impl Into<String>,
        target: &str,
    ) -> Arc<SyslogSink> {
        let writer = TcpSyslogWriter::new(target)
            .with_connection_timeout(self.config.syslog.connection_timeout)
            .with_write_timeout(self.config.syslog.write_timeout);
        self.syslog_with_writer(id, app_id, writer)
    }

    /// Syslog sink relaying through any writer
    pub fn syslog_with_writer<W: SyslogWriter>(
        &self,
        id: impl Into<String>,
        app_id: impl Into<String>,
        writer: W,
    ) -> Arc<SyslogSink> {
        SyslogSink::spawn(
            id,
            app_id,
            &self.hostname,
            writer,
            self.config.syslog.buffer_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_sinks::Sink;
    use tokio::sync::mpsc;

    fn factory() -> SinkFactory {
        let mut config = SinksConfig::default();
        config.dump.capacity = 3;
        config.container_metric.freshness_window = Duration::from_secs(30);
        SinkFactory::new(config, "courier-0")
    }

    #[test]
    fn test_dump_uses_configured_capacity() {
        let sink = factory().dump("dump-1", "app-1");
        assert_eq!(sink.capacity(), 3);
        assert_eq!(sink.app_id(), Some("app-1"));
    }

    #[test]
    fn test_container_metric_sink() {
        let sink = factory().container_metric("cm-1", "app-1");
        assert_eq!(sink.id(), "cm-1");
        assert!(!sink.should_receive_errors());
    }

    #[tokio::test]
    async fn test_live_sinks_spawn() {
        let factory = factory();
        let (tx, _rx) = mpsc::channel(4);
        let ws = factory.websocket("ws-1", None, tx);
        assert!(ws.is_healthy());
        assert_eq!(ws.app_id(), None);

        let syslog = factory.syslog("drain-1", "app-1", "127.0.0.1:1");
        assert_eq!(syslog.app_id(), Some("app-1"));
        syslog.close();
        ws.close();
    }

    #[test]
    fn test_dump_inactivity_timeout() {
        let factory = factory();
        assert_eq!(
            factory.dump_inactivity_timeout(),
            SinksConfig::default().dump.inactivity_timeout
        );
    }
}
