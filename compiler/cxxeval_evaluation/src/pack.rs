//! Determines how many elements a pack expansion expands to.

use cxxeval_term::{
    r#type::Type,
    template::{PackSize, TemplateArgument, TemplateParameterMap},
};

use crate::{
    kind::{Binding, Kind, UnaryOperator},
    stack::ensure_sufficient_stack,
    Evaluation,
};

impl Evaluation {
    /// Searches the tree for a usage of a parameter pack and returns the
    /// number of arguments `map` binds to it.
    ///
    /// Called on a [`Kind::ParameterPack`], the pattern of the expansion is
    /// searched. Pack expansions nested deeper in the tree are expanded on
    /// their own and don't contribute.
    #[must_use]
    pub fn determine_pack_size(&self, map: &TemplateParameterMap) -> PackSize {
        match self.kind() {
            Kind::ParameterPack(pack) => pack.pattern().pack_size_within(map),
            _ => self.pack_size_within(map),
        }
    }

    fn pack_size_within(&self, map: &TemplateParameterMap) -> PackSize {
        ensure_sufficient_stack(|| {
            let own = match self.kind() {
                Kind::ParameterPack(_) => return PackSize::NotFound,

                // `sizeof...(Ts)` names the pack without expanding it
                Kind::Unary(unary)
                    if unary.operator() == UnaryOperator::SizeofPack =>
                {
                    return PackSize::NotFound;
                }

                Kind::Fixed(fixed) => fixed.ty().determine_pack_size(map),
                Kind::Binding(Binding::TemplateParameter { parameter, ty }) => {
                    map.determine_pack_size(*parameter)
                        .combine(ty.determine_pack_size(map))
                }
                Kind::Binding(binding) => {
                    binding.declared_type().determine_pack_size(map)
                }
                Kind::UnaryTypeId(type_id) => {
                    type_id.ty().determine_pack_size(map)
                }
                Kind::TypeId(type_id) => type_id.ty().determine_pack_size(map),
                Kind::FunctionSet(set) => set
                    .template_arguments()
                    .iter()
                    .flatten()
                    .map(|argument| argument.determine_pack_size(map))
                    .collect(),

                Kind::Unary(_)
                | Kind::Binary(_)
                | Kind::Conditional(_)
                | Kind::Comma(_)
                | Kind::FunctionCall(_)
                | Kind::InitializerList(_) => PackSize::NotFound,
            };

            self.kind()
                .children()
                .into_iter()
                .map(|child| child.pack_size_within(map))
                .fold(own, PackSize::combine)
        })
    }
}

/// Expands the pack expansions among template arguments (`Ts...`) and
/// instantiates the others.
pub(crate) fn instantiate_arguments(
    arguments: &[TemplateArgument],
    map: &TemplateParameterMap,
    pack_offset: Option<usize>,
) -> Vec<TemplateArgument> {
    let mut instantiated = Vec::with_capacity(arguments.len());

    for argument in arguments {
        let TemplateArgument::Type(Type::PackExpansion(pattern)) = argument
        else {
            instantiated.push(argument.instantiate(map, pack_offset));
            continue;
        };

        match pattern.determine_pack_size(map) {
            PackSize::Count(count) => {
                instantiated.extend((0..count).map(|offset| {
                    TemplateArgument::Type(pattern.instantiate(map, Some(offset)))
                }));
            }
            size => {
                log::debug!("template argument pack left unexpanded: {size:?}");
                instantiated.push(argument.instantiate(map, pack_offset));
            }
        }
    }

    instantiated
}
