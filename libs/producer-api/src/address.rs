use std::str::FromStr;

use crate::error::ConnectionError;

/// Адрес брокера в форме `host:port`.
///
/// Хост не резолвится — это задача транспорта. Проверяется только форма:
/// непустой host и ненулевой порт. IPv6 пишется в скобках: `[::1]:9092`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerAddress {
    host: String,
    port: u16,
}

impl BrokerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Распарсить список адресов. Первый некорректный элемент — ошибка.
    pub fn parse_list<S: AsRef<str>>(addresses: &[S]) -> Result<Vec<BrokerAddress>, ConnectionError> {
        addresses.iter().map(|a| a.as_ref().parse()).collect()
    }
}

impl FromStr for BrokerAddress {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConnectionError::InvalidAddress {
            address: s.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = s.trim().rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
        let host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number in 1..=65535"))?;
        if port == 0 {
            return Err(invalid("port must be non-zero"));
        }
        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
