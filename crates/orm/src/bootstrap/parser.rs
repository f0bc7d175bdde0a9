//! Contract for the external descriptor and mapper parser.

use crate::error::{BoxError, ResourceKind, SessionError, SessionResult};
use crate::resource::ResourceRef;
use crate::session::SessionConfiguration;
use mapforge_core::Properties;
use std::fmt;
use std::io::Read;

/// Parses descriptor and mapper resources into a configuration.
///
/// The grammar of both resource kinds belongs to the implementation; the
/// assembler only decides when each parse runs.
pub trait DescriptorParser: fmt::Debug + Send + Sync {
    fn parse_descriptor(
        &self,
        stream: &mut dyn Read,
        configuration: &mut SessionConfiguration,
        overrides: &Properties,
    ) -> Result<(), BoxError>;

    fn parse_mapper(
        &self,
        stream: &mut dyn Read,
        configuration: &mut SessionConfiguration,
        identity: &str,
    ) -> Result<(), BoxError>;
}

/// Open `resource` and run `parse` over its stream, wrapping failures with
/// the resource identity
pub(crate) fn parse_resource<F>(
    resource: &ResourceRef,
    kind: ResourceKind,
    configuration: &mut SessionConfiguration,
    parse: F,
) -> SessionResult<()>
where
    F: FnOnce(&mut dyn Read, &mut SessionConfiguration, &str) -> Result<(), BoxError>,
{
    let identity = resource.description();
    let mut stream = resource
        .open()
        .map_err(|source| SessionError::ResourceUnreadable {
            resource: identity.clone(),
            source,
        })?;
    parse(stream.as_mut(), configuration, &identity)
        .map_err(|source| SessionError::parse_failure(kind, identity.clone(), source))?;
    configuration.add_loaded_resource(identity);
    Ok(())
}
