use super::{Argument, Parameter, ParameterBinding};
use crate::descriptor::{ParameterSpec, QueryDescriptor};
use crate::error::{NativeQueryError, Result};
use crate::filter::{AccessorInfoCache, FieldValue, Filter, FilterTypeRef, ResolvedAccessor};
use crate::pagination::{PageRequest, Sort};
use crate::transform::Operator;
use crate::utils::naming::qualify;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Turns one invocation's arguments into a fresh [`ParameterBinding`]
#[derive(Debug, Clone, Copy)]
pub struct ParameterBinder<'a> {
    accessors: &'a AccessorInfoCache,
}

impl<'a> ParameterBinder<'a> {
    pub fn new(accessors: &'a AccessorInfoCache) -> Self {
        Self { accessors }
    }

    pub fn bind(
        &self,
        descriptor: &QueryDescriptor,
        arguments: &[Argument<'_>],
    ) -> Result<ParameterBinding> {
        let specs = descriptor.parameter_specs();
        if specs.len() != arguments.len() {
            return Err(NativeQueryError::argument_mismatch(
                descriptor.key().label(),
                format!(
                    "expected {} arguments, got {}",
                    specs.len(),
                    arguments.len()
                ),
            ));
        }

        let mut parameters = Vec::new();
        let mut explicit_sort: Option<Sort> = None;
        let mut page_sort: Option<Sort> = None;
        let mut page: Option<PageRequest> = None;

        for (position, (spec, argument)) in specs.iter().zip(arguments).enumerate() {
            match (spec, argument) {
                (ParameterSpec::Pagination, Argument::Page(request)) => {
                    if page_sort.is_none() {
                        page_sort = request.effective_sort().cloned();
                    }
                    page = Some(request.clone());
                }
                (ParameterSpec::Sort, Argument::Sort(sort)) => {
                    explicit_sort = Some(sort.clone());
                }
                (ParameterSpec::Pagination | ParameterSpec::Sort, Argument::Value(Value::Null)) => {}

                (ParameterSpec::Direct { name }, Argument::Value(value)) => match value {
                    Value::Object(map) => parameters.extend(Self::of_map(map, name)),
                    other => parameters.push(Parameter::new(name.as_str(), other.clone())),
                },
                (ParameterSpec::Annotated { name, operator }, Argument::Value(value)) => match value {
                    Value::Object(map) => parameters.extend(Self::of_map(map, name)),
                    other => parameters.push(Parameter::new(
                        name.as_str(),
                        operator.transform(other.clone()),
                    )),
                },

                (ParameterSpec::Flatten { prefix, filter }, Argument::Filter(instance)) => {
                    parameters.extend(self.of_declared_methods(prefix, filter, Some(*instance))?);
                }
                (ParameterSpec::Flatten { prefix, filter }, Argument::Value(Value::Null)) => {
                    parameters.extend(self.of_declared_methods(prefix, filter, None)?);
                }

                (spec, argument) => {
                    return Err(NativeQueryError::argument_mismatch(
                        descriptor.key().label(),
                        format!(
                            "argument {position} is a {} but is declared as {}",
                            argument.kind(),
                            spec.kind()
                        ),
                    ));
                }
            }
        }

        for parameter in &parameters {
            debug!(
                parameter = %parameter.name,
                value = %parameter.value,
                "Parameter bound"
            );
        }

        Ok(ParameterBinding::new(
            parameters,
            explicit_sort.or(page_sort),
            page,
        ))
    }

    /// Expand a map into `name -> [keys]` plus one parameter per entry
    pub fn of_map(map: &Map<String, Value>, name: &str) -> Vec<Parameter> {
        let keys = map.keys().cloned().map(Value::String).collect();

        let mut parameters = Vec::with_capacity(map.len() + 1);
        parameters.push(Parameter::new(name, Value::Array(keys)));
        parameters.extend(
            map.iter()
                .map(|(key, value)| Parameter::new(key.as_str(), value.clone())),
        );
        parameters
    }

    /// Flatten a filter object into parameters qualified by `prefix`.
    ///
    /// An absent instance still yields one `null` parameter per member, so a
    /// template can test every flattened name regardless of what was passed.
    pub fn of_declared_methods(
        &self,
        prefix: &str,
        filter: &FilterTypeRef,
        instance: Option<&dyn Filter>,
    ) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();
        let mut path = Vec::new();
        self.flatten_into(prefix, filter, instance, &mut path, &mut parameters)?;
        Ok(parameters)
    }

    fn flatten_into(
        &self,
        prefix: &str,
        filter: &FilterTypeRef,
        instance: Option<&dyn Filter>,
        path: &mut Vec<&'static str>,
        out: &mut Vec<Parameter>,
    ) -> Result<()> {
        let info = self.accessors.get_or_resolve(filter)?;
        path.push(filter.type_name());

        for accessor in &info.accessors {
            let value = match instance {
                Some(instance) => read_member(instance, filter, accessor),
                None => FieldValue::Absent,
            };

            match &accessor.param {
                Some(param) if param.flatten => {
                    let nested = accessor.nested.ok_or_else(|| {
                        NativeQueryError::invalid_declaration(
                            member_label(filter, accessor),
                            "flatten requested on a member without a nested filter type",
                        )
                    })?;
                    let child_prefix = qualify(prefix, &param.name);

                    match value {
                        FieldValue::Nested(child) => {
                            self.flatten_into(&child_prefix, &nested, Some(child), path, out)?
                        }
                        FieldValue::Absent | FieldValue::Value(Value::Null) => {
                            // Absent values carry no data to terminate a self-referencing type
                            if !path.contains(&nested.type_name()) {
                                self.flatten_into(&child_prefix, &nested, None, path, out)?
                            }
                        }
                        FieldValue::Value(_) => {
                            return Err(NativeQueryError::invalid_declaration(
                                member_label(filter, accessor),
                                "flattened member returned a plain value instead of a nested filter",
                            ));
                        }
                    }
                }
                Some(param) => {
                    let name = qualify(prefix, &param.name);
                    bind_member(filter, accessor, name, param.operator, value, out)?;
                }
                None => {
                    let name = qualify(prefix, &accessor.name);
                    bind_member(filter, accessor, name, Operator::Equal, value, out)?;
                }
            }
        }

        path.pop();
        Ok(())
    }
}

fn read_member<'f>(
    instance: &'f dyn Filter,
    filter: &FilterTypeRef,
    accessor: &ResolvedAccessor,
) -> FieldValue<'f> {
    match instance.read(&accessor.name) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                filter_type = filter.type_name(),
                accessor = %accessor.name,
                error = %e,
                "Filter accessor failed, treating member as absent"
            );
            FieldValue::Absent
        }
    }
}

fn bind_member(
    filter: &FilterTypeRef,
    accessor: &ResolvedAccessor,
    name: String,
    operator: Operator,
    value: FieldValue<'_>,
    out: &mut Vec<Parameter>,
) -> Result<()> {
    match value {
        FieldValue::Value(Value::Object(map)) => out.extend(ParameterBinder::of_map(&map, &name)),
        FieldValue::Value(value) => out.push(Parameter::new(name, operator.transform(value))),
        FieldValue::Absent => out.push(Parameter::new(name, operator.transform(Value::Null))),
        FieldValue::Nested(_) => {
            return Err(NativeQueryError::invalid_declaration(
                member_label(filter, accessor),
                "nested filter returned by a member that is not declared with flatten",
            ));
        }
    }
    Ok(())
}

fn member_label(filter: &FilterTypeRef, accessor: &ResolvedAccessor) -> String {
    format!("{}.{}", filter.type_name(), accessor.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ParamDecl;
    use crate::filter::{AccessError, FilterSchema, MemberDecl};
    use serde_json::json;

    struct Address {
        city: Option<String>,
        zip: String,
    }

    impl Filter for Address {
        fn schema() -> FilterSchema {
            FilterSchema::of::<Self>()
                .field(MemberDecl::new("city").param(ParamDecl::new("city").operator(Operator::StartsWith)))
                .field(MemberDecl::new("zip"))
        }

        fn read(&self, accessor: &str) -> std::result::Result<FieldValue<'_>, AccessError> {
            match accessor {
                "city" => Ok(json!(self.city).into()),
                "zip" => Ok(json!(self.zip).into()),
                other => Err(AccessError::unknown::<Self>(other)),
            }
        }
    }

    struct UserFilter {
        name: Option<String>,
        address: Option<Address>,
        tags: Map<String, Value>,
    }

    impl Filter for UserFilter {
        fn schema() -> FilterSchema {
            FilterSchema::of::<Self>()
                .field(MemberDecl::new("name").param(ParamDecl::new("name")))
                .field(
                    MemberDecl::new("address")
                        .param(ParamDecl::new("address").flatten())
                        .nested::<Address>(),
                )
                .field(MemberDecl::new("tags"))
                .accessor(MemberDecl::new("broken"))
        }

        fn read(&self, accessor: &str) -> std::result::Result<FieldValue<'_>, AccessError> {
            match accessor {
                "name" => Ok(json!(self.name).into()),
                "address" => Ok(FieldValue::nested_opt(self.address.as_ref())),
                "tags" => Ok(Value::Object(self.tags.clone()).into()),
                "broken" => Err(AccessError::failed("broken", "unreadable")),
                other => Err(AccessError::unknown::<Self>(other)),
            }
        }
    }

    struct Node;

    impl Filter for Node {
        fn schema() -> FilterSchema {
            FilterSchema::of::<Self>()
                .field(MemberDecl::new("id"))
                .field(MemberDecl::new("parent").param(ParamDecl::new("parent").flatten()).nested::<Node>())
        }

        fn read(&self, accessor: &str) -> std::result::Result<FieldValue<'_>, AccessError> {
            Err(AccessError::unknown::<Self>(accessor))
        }
    }

    fn names(parameters: &[Parameter]) -> Vec<&str> {
        parameters.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_of_map() {
        let map = json!({"a": 1, "b": 2});
        let parameters = ParameterBinder::of_map(map.as_object().unwrap(), "filters");

        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters[0], Parameter::new("filters", json!(["a", "b"])));
        assert!(parameters.contains(&Parameter::new("a", json!(1))));
        assert!(parameters.contains(&Parameter::new("b", json!(2))));
    }

    #[test]
    fn test_flatten_declared_member() {
        let cache = AccessorInfoCache::new();
        let binder = ParameterBinder::new(&cache);
        let filter = UserFilter {
            name: Some("Al".to_string()),
            address: None,
            tags: Map::new(),
        };

        let parameters = binder
            .of_declared_methods("", &FilterTypeRef::of::<UserFilter>(), Some(&filter))
            .unwrap();

        assert_eq!(parameters[0], Parameter::new("Broken", Value::Null));
        assert_eq!(parameters[1], Parameter::new("Name", json!("Al")));
    }

    #[test]
    fn test_flatten_nested_member() {
        let cache = AccessorInfoCache::new();
        let binder = ParameterBinder::new(&cache);
        let filter = UserFilter {
            name: None,
            address: Some(Address {
                city: Some("Rio".to_string()),
                zip: "20000".to_string(),
            }),
            tags: json!({"vip": true}).as_object().unwrap().clone(),
        };

        let parameters = binder
            .of_declared_methods("Filter", &FilterTypeRef::of::<UserFilter>(), Some(&filter))
            .unwrap();

        assert_eq!(
            names(&parameters),
            vec![
                "FilterBroken",
                "FilterName",
                "FilterAddressCity",
                "FilterAddressZip",
                "FilterTags",
                "vip",
            ]
        );
        assert_eq!(parameters[0].value, Value::Null);
        assert_eq!(parameters[2].value, json!("Rio%"));
        assert_eq!(parameters[4].value, json!(["vip"]));
    }

    #[test]
    fn test_absent_nested_member_binds_nulls() {
        let cache = AccessorInfoCache::new();
        let binder = ParameterBinder::new(&cache);

        let parameters = binder
            .of_declared_methods("", &FilterTypeRef::of::<UserFilter>(), None)
            .unwrap();

        assert!(parameters.contains(&Parameter::new("AddressCity", Value::Null)));
        assert!(parameters.contains(&Parameter::new("AddressZip", Value::Null)));
    }

    #[test]
    fn test_self_referencing_type_terminates() {
        let cache = AccessorInfoCache::new();
        let binder = ParameterBinder::new(&cache);

        let parameters = binder
            .of_declared_methods("", &FilterTypeRef::of::<Node>(), None)
            .unwrap();

        assert_eq!(names(&parameters), vec!["Id"]);
    }
}
