//! Loading the ordered mapper list.

use crate::bootstrap::parser::{parse_resource, DescriptorParser};
use crate::error::{ResourceKind, SessionError, SessionResult};
use crate::resource::ResourceRef;
use crate::session::SessionConfiguration;

/// Parses mapper resources in order, stopping at the first failure
#[derive(Debug)]
pub struct MapperLoader<'a> {
    parser: Option<&'a dyn DescriptorParser>,
}

impl<'a> MapperLoader<'a> {
    /// A loader without a parser accepts only lists with no present entries
    pub fn new(parser: Option<&'a dyn DescriptorParser>) -> Self {
        Self { parser }
    }

    /// Absent entries are skipped. An absent or empty list is not an error.
    pub fn load(
        &self,
        configuration: &mut SessionConfiguration,
        mappers: Option<&[Option<ResourceRef>]>,
    ) -> SessionResult<usize> {
        let mappers = match mappers {
            Some(mappers) => mappers,
            None => {
                tracing::debug!("Property 'mapperLocations' was not specified");
                return Ok(0);
            }
        };
        if mappers.is_empty() {
            tracing::warn!("Property 'mapperLocations' was specified but matching resources are not found");
            return Ok(0);
        }

        let mut parsed = 0;
        for mapper in mappers.iter().flatten() {
            let parser = self
                .parser
                .ok_or_else(|| SessionError::missing_required("descriptorParser"))?;
            parse_resource(mapper, ResourceKind::Mapper, configuration, |stream, configuration, identity| {
                parser.parse_mapper(stream, configuration, identity)
            })?;
            parsed += 1;
            tracing::debug!("Parsed mapper file: '{}'", mapper.description());
        }
        Ok(parsed)
    }
}
