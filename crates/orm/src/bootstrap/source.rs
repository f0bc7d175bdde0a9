//! Choosing where the base configuration comes from.

use crate::bootstrap::parser::{parse_resource, DescriptorParser};
use crate::error::{ResourceKind, SessionError, SessionResult};
use crate::resource::ResourceRef;
use crate::session::SessionConfiguration;
use mapforge_core::Properties;

/// Origin of the base configuration
#[derive(Debug, Clone)]
pub enum ConfigurationSource {
    Explicit(SessionConfiguration),
    Descriptor(ResourceRef),
    Default,
}

impl ConfigurationSource {
    /// Combine the optional inputs, rejecting both at once
    pub fn from_parts(
        explicit: Option<SessionConfiguration>,
        descriptor: Option<ResourceRef>,
    ) -> SessionResult<Self> {
        match (explicit, descriptor) {
            (Some(_), Some(_)) => Err(SessionError::ConfigConflict),
            (Some(configuration), None) => Ok(ConfigurationSource::Explicit(configuration)),
            (None, Some(resource)) => Ok(ConfigurationSource::Descriptor(resource)),
            (None, None) => Ok(ConfigurationSource::Default),
        }
    }
}

/// A descriptor parse deferred until pre-parse registrations are applied
#[derive(Debug)]
#[must_use = "a pending descriptor parse does nothing until executed"]
pub struct PendingParse {
    resource: ResourceRef,
    overrides: Properties,
}

impl PendingParse {
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn execute(
        self,
        parser: &dyn DescriptorParser,
        configuration: &mut SessionConfiguration,
    ) -> SessionResult<()> {
        let overrides = self.overrides;
        parse_resource(
            &self.resource,
            ResourceKind::Descriptor,
            configuration,
            |stream, configuration, _| parser.parse_descriptor(stream, configuration, &overrides),
        )?;
        tracing::debug!("Parsed configuration file: '{}'", self.resource.description());
        Ok(())
    }
}

pub struct SourceResolver;

impl SourceResolver {
    /// Produce the base configuration and the descriptor parse, if any.
    ///
    /// Nothing is parsed here.
    pub fn resolve(
        explicit: Option<SessionConfiguration>,
        descriptor: Option<ResourceRef>,
        overrides: &Properties,
    ) -> SessionResult<(SessionConfiguration, Option<PendingParse>)> {
        match ConfigurationSource::from_parts(explicit, descriptor)? {
            ConfigurationSource::Explicit(mut configuration) => {
                configuration.merge_variables(overrides);
                Ok((configuration, None))
            }
            ConfigurationSource::Descriptor(resource) => {
                let mut configuration = SessionConfiguration::new();
                configuration.set_variables(overrides.clone());
                let pending = PendingParse {
                    resource,
                    overrides: overrides.clone(),
                };
                Ok((configuration, Some(pending)))
            }
            ConfigurationSource::Default => {
                tracing::debug!("Property 'configuration' or 'configLocation' not specified, using default configuration");
                let mut configuration = SessionConfiguration::new();
                configuration.set_variables(overrides.clone());
                Ok((configuration, None))
            }
        }
    }
}
