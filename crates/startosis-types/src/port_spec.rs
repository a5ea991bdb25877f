//! `PortSpec(number, transport_protocol?, application_protocol?)`.

use startosis_args::validators::{self, Pattern};
use startosis_args::{ArgumentKind, BuiltinArgument};
use startosis_core::{InterpretationError, Result, StartosisError, Value};

use crate::constructor::{kurtosis_value_type, KurtosisValueType};
use crate::records::{PortSpecRecord, TransportProtocol};

pub const PORT_SPEC_TYPE_NAME: &str = "PortSpec";

pub const PORT_NUMBER_ATTR: &str = "number";
pub const TRANSPORT_PROTOCOL_ATTR: &str = "transport_protocol";
pub const APPLICATION_PROTOCOL_ATTR: &str = "application_protocol";

const MIN_PORT_NUMBER: u64 = 1;
const MAX_PORT_NUMBER: u64 = 65535;
static APPLICATION_PROTOCOL: Pattern = Pattern::new(r"^[a-zA-Z0-9+.-]*$");

fn validate_port_number(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::uint64_in_range(value, name, MIN_PORT_NUMBER, MAX_PORT_NUMBER)
}

fn validate_transport_protocol(
    value: &Value,
    name: &str,
) -> std::result::Result<(), InterpretationError> {
    // Empty is accepted and means TCP.
    if value.as_str() == Some("") {
        return Ok(());
    }
    validators::string_values(value, name, TransportProtocol::NAMES)
}

fn validate_application_protocol(
    value: &Value,
    name: &str,
) -> std::result::Result<(), InterpretationError> {
    validators::string_regexp(value, name, &APPLICATION_PROTOCOL)
}

fn port_spec_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(PORT_NUMBER_ATTR, ArgumentKind::INT)
            .with_validator(validate_port_number),
        BuiltinArgument::optional(TRANSPORT_PROTOCOL_ATTR, ArgumentKind::STRING)
            .with_validator(validate_transport_protocol),
        BuiltinArgument::optional(APPLICATION_PROTOCOL_ATTR, ArgumentKind::STRING)
            .with_validator(validate_application_protocol),
    ]
}

kurtosis_value_type!(
    /// A port exposed by a service.
    PortSpec,
    PORT_SPEC_TYPE_NAME,
    port_spec_arguments
);

impl PortSpec {
    /// Build a port spec from Rust code.
    pub fn create(
        number: u16,
        transport_protocol: TransportProtocol,
        application_protocol: Option<&str>,
    ) -> Result<Self> {
        let mut named = vec![
            (PORT_NUMBER_ATTR.to_string(), Value::from(u32::from(number))),
            (
                TRANSPORT_PROTOCOL_ATTR.to_string(),
                Value::from(transport_protocol.as_str()),
            ),
        ];
        if let Some(protocol) = application_protocol.filter(|p| !p.is_empty()) {
            named.push((APPLICATION_PROTOCOL_ATTR.to_string(), Value::from(protocol)));
        }
        <Self as KurtosisValueType>::create(named)
    }

    pub fn number(&self) -> Result<u16> {
        let number: u64 = self.base.required_attr_value(PORT_NUMBER_ATTR)?;
        if !(MIN_PORT_NUMBER..=MAX_PORT_NUMBER).contains(&number) {
            return Err(StartosisError::interpretation(format!(
                "Port number should be in range [{} - {}]",
                MIN_PORT_NUMBER, MAX_PORT_NUMBER
            )));
        }
        u16::try_from(number).map_err(|_| {
            StartosisError::interpretation(format!("Port number {} does not fit in 16 bits", number))
        })
    }

    /// The transport protocol; unset or empty means TCP.
    pub fn transport_protocol(&self) -> Result<TransportProtocol> {
        let protocol: Option<String> = self.base.extract_attr_value(TRANSPORT_PROTOCOL_ATTR)?;
        match protocol.as_deref() {
            None | Some("") => Ok(TransportProtocol::Tcp),
            Some(text) => TransportProtocol::parse(text).ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Port protocol should be one of {}",
                    TransportProtocol::NAMES.join(", ")
                ))
            }),
        }
    }

    pub fn application_protocol(&self) -> Result<Option<String>> {
        let protocol: Option<String> = self.base.extract_attr_value(APPLICATION_PROTOCOL_ATTR)?;
        Ok(protocol.filter(|p| !p.is_empty()))
    }

    pub fn to_kurtosis_type(&self) -> Result<PortSpecRecord> {
        Ok(PortSpecRecord {
            number: self.number()?,
            transport_protocol: self.transport_protocol()?,
            application_protocol: self.application_protocol()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use startosis_core::stringify;

    fn construct(positional: Vec<Value>, named: Vec<(&str, Value)>) -> Result<Value> {
        PortSpec::constructor().unwrap().construct(
            positional,
            named.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )
    }

    #[test]
    fn test_defaults_to_tcp() {
        let value = construct(vec![Value::from(80)], vec![]).unwrap();
        let port = value.downcast_ref::<PortSpec>().unwrap();
        assert_eq!(
            port.to_kurtosis_type().unwrap(),
            PortSpecRecord {
                number: 80,
                transport_protocol: TransportProtocol::Tcp,
                application_protocol: None,
            }
        );
        assert_eq!(stringify(&value), "PortSpec(number=80)");
    }

    #[test]
    fn test_all_attributes() {
        let value = construct(
            vec![Value::from(5353), Value::from("UDP")],
            vec![("application_protocol", Value::from("dns"))],
        )
        .unwrap();
        let record = value.downcast_ref::<PortSpec>().unwrap().to_kurtosis_type().unwrap();
        assert_eq!(record.transport_protocol, TransportProtocol::Udp);
        assert_eq!(record.application_protocol.as_deref(), Some("dns"));
    }

    #[test]
    fn test_rejects_out_of_range_and_bad_protocol() {
        let err = construct(vec![Value::from(70000)], vec![]).unwrap_err();
        assert!(err.to_string().contains("number"));

        let err = construct(vec![Value::from(80), Value::from("ICMP")], vec![]).unwrap_err();
        assert!(err.to_string().contains("transport_protocol"));

        let err = construct(
            vec![Value::from(80)],
            vec![("application_protocol", Value::from("http/2"))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("application_protocol"));
    }

    #[test]
    fn test_create() {
        let port = PortSpec::create(8080, TransportProtocol::Tcp, Some("http")).unwrap();
        assert_eq!(
            port.to_string(),
            "PortSpec(number=8080, transport_protocol=\"TCP\", application_protocol=\"http\")"
        );
        let port = PortSpec::create(8080, TransportProtocol::Sctp, Some("")).unwrap();
        assert!(!port.base().is_set(APPLICATION_PROTOCOL_ATTR));
    }
}
