//! Contains the instantiation of evaluations: the substitution of template
//! arguments for the template parameters a tree refers to.

use std::collections::BTreeMap;

use cxxeval_term::{
    r#type::{Primitive, Type},
    template::{PackSize, TemplateArgument, TemplateParameterMap},
    value::Value,
    FunctionID, TemplateID, ValueCategory,
};
use getset::CopyGetters;

use crate::{
    kind::{
        Binary, Binding, Comma, Conditional, Fixed, FunctionCall, FunctionSet,
        InitializerList, Kind, ParameterPack, TypeId, Unary, UnaryOperator,
        UnaryTypeId,
    },
    pack,
    scope::Scope,
    stack::ensure_sufficient_stack,
    Evaluation,
};

/// The specialization of a class template an evaluation is instantiated
/// within.
///
/// Overload sets named inside the template refer to the members of the
/// template; within the specialization they're replaced by the corresponding
/// members of the specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, derive_new::new)]
pub struct Specialization<'a> {
    /// The template being specialized.
    #[get_copy = "pub"]
    template: TemplateID,

    /// Maps the member functions of the template to the ones of the
    /// specialization.
    #[get_copy = "pub"]
    members: &'a BTreeMap<FunctionID, FunctionID>,
}

impl Evaluation {
    /// Substitutes the template arguments of `map` for the template
    /// parameters the tree refers to.
    ///
    /// `pack_offset` selects the element of the packs being expanded; with
    /// `None` a reference to a pack is left dependent. Every level of the tree
    /// consumes one unit of `max_depth`; once it runs out, the rest of the tree
    /// is returned as is.
    ///
    /// The original node is returned (see [`Evaluation::ptr_eq`]) when the
    /// substitution doesn't change anything.
    #[must_use]
    pub fn instantiate(
        &self,
        map: &TemplateParameterMap,
        pack_offset: Option<usize>,
        within: Option<&Specialization<'_>>,
        max_depth: usize,
        scope: &dyn Scope,
    ) -> Self {
        Instantiator { map, within, scope }.instantiate(
            self,
            pack_offset,
            max_depth,
        )
    }
}

struct Instantiator<'a> {
    map: &'a TemplateParameterMap,
    within: Option<&'a Specialization<'a>>,
    scope: &'a dyn Scope,
}

fn same(lhs: &[Evaluation], rhs: &[Evaluation]) -> bool {
    lhs.len() == rhs.len()
        && lhs.iter().zip(rhs).all(|(lhs, rhs)| lhs.ptr_eq(rhs))
}

impl Instantiator<'_> {
    fn members_of(
        &self,
        evaluation: &Evaluation,
    ) -> Option<&BTreeMap<FunctionID, FunctionID>> {
        self.within
            .filter(|within| {
                evaluation.template_definition() == Some(within.template)
            })
            .map(|within| within.members)
    }

    fn instantiate(
        &self,
        evaluation: &Evaluation,
        pack_offset: Option<usize>,
        depth: usize,
    ) -> Evaluation {
        if !evaluation.references_template_parameter()
            && self.members_of(evaluation).is_none()
        {
            return evaluation.clone();
        }

        let Some(depth) = depth.checked_sub(1) else {
            log::debug!("instantiation depth exhausted, the tree is left as is");
            return evaluation.clone();
        };

        ensure_sufficient_stack(|| {
            self.instantiate_kind(evaluation, pack_offset, depth)
        })
    }

    fn instantiate_kind(
        &self,
        evaluation: &Evaluation,
        pack_offset: Option<usize>,
        depth: usize,
    ) -> Evaluation {
        match evaluation.kind() {
            Kind::Fixed(fixed) => {
                let ty = fixed.ty().instantiate(self.map, pack_offset);

                if ty == *fixed.ty() {
                    evaluation.clone()
                } else {
                    evaluation.derive(Fixed::new(
                        ty,
                        fixed.value().clone(),
                        fixed.category(),
                    ))
                }
            }
            Kind::Binding(binding) => {
                self.instantiate_binding(evaluation, binding, pack_offset)
            }
            Kind::Unary(unary) => {
                self.instantiate_unary(evaluation, unary, pack_offset, depth)
            }
            Kind::Binary(binary) => {
                let lhs = self.instantiate(binary.lhs(), pack_offset, depth);
                let rhs = self.instantiate(binary.rhs(), pack_offset, depth);

                if lhs.ptr_eq(binary.lhs()) && rhs.ptr_eq(binary.rhs()) {
                    evaluation.clone()
                } else {
                    evaluation.derive(Binary::new(binary.operator(), lhs, rhs))
                }
            }
            Kind::UnaryTypeId(type_id) => {
                let ty = type_id.ty().instantiate(self.map, pack_offset);

                if ty == *type_id.ty() {
                    evaluation.clone()
                } else {
                    evaluation.derive(UnaryTypeId::new(type_id.operator(), ty))
                }
            }
            Kind::Conditional(conditional) => self.instantiate_conditional(
                evaluation,
                conditional,
                pack_offset,
                depth,
            ),
            Kind::Comma(comma) => {
                let expressions =
                    self.instantiate_list(comma.expressions(), pack_offset, depth);

                if same(&expressions, comma.expressions()) {
                    evaluation.clone()
                } else {
                    evaluation.derive(Comma::new(expressions))
                }
            }
            Kind::FunctionCall(call) => {
                self.instantiate_call(evaluation, call, pack_offset, depth)
            }
            Kind::FunctionSet(set) => {
                self.instantiate_function_set(evaluation, set, pack_offset)
            }
            Kind::InitializerList(list) => {
                let clauses =
                    self.instantiate_list(list.clauses(), pack_offset, depth);

                if same(&clauses, list.clauses()) {
                    evaluation.clone()
                } else {
                    evaluation.derive(InitializerList::new(clauses))
                }
            }
            Kind::TypeId(type_id) => {
                let ty = type_id.ty().instantiate(self.map, pack_offset);
                let arguments =
                    self.instantiate_list(type_id.arguments(), pack_offset, depth);

                if ty == *type_id.ty() && same(&arguments, type_id.arguments()) {
                    evaluation.clone()
                } else {
                    evaluation.derive(TypeId::new(ty, arguments))
                }
            }
            Kind::ParameterPack(pack) => {
                let pattern =
                    self.instantiate(pack.pattern(), pack_offset, depth);

                if pattern.ptr_eq(pack.pattern()) {
                    evaluation.clone()
                } else {
                    evaluation.derive(ParameterPack::new(pattern))
                }
            }
        }
    }

    fn instantiate_binding(
        &self,
        evaluation: &Evaluation,
        binding: &Binding,
        pack_offset: Option<usize>,
    ) -> Evaluation {
        match binding {
            Binding::TemplateParameter { parameter, ty } => {
                match self.map.argument(parameter.id, pack_offset) {
                    Some(TemplateArgument::NonType { value, r#type }) => {
                        evaluation.derive(Fixed::new(
                            r#type.clone(),
                            value.clone(),
                            ValueCategory::PRValue,
                        ))
                    }
                    Some(TemplateArgument::Type(_)) => {
                        log::debug!(
                            "non-type template parameter {} bound to a type",
                            parameter.id
                        );
                        Evaluation::problem()
                    }
                    None => {
                        let instantiated = ty.instantiate(self.map, pack_offset);

                        if instantiated == *ty {
                            evaluation.clone()
                        } else {
                            evaluation.derive(Binding::TemplateParameter {
                                parameter: *parameter,
                                ty: instantiated,
                            })
                        }
                    }
                }
            }

            Binding::FunctionParameter { position, ty, is_pack } => {
                let element = pack_offset.filter(|offset| {
                    *is_pack
                        && matches!(
                            ty.determine_pack_size(self.map),
                            PackSize::Count(count) if *offset < count
                        )
                });

                let instantiated = ty.instantiate(self.map, pack_offset);

                match element {
                    // the i-th element of `Ts... args` is the parameter at
                    // `position + i`
                    Some(offset) => evaluation.derive(Binding::FunctionParameter {
                        position: position + offset,
                        ty: instantiated,
                        is_pack: false,
                    }),
                    None if instantiated == *ty => evaluation.clone(),
                    None => evaluation.derive(Binding::FunctionParameter {
                        position: *position,
                        ty: instantiated,
                        is_pack: *is_pack,
                    }),
                }
            }

            Binding::Variable { id, ty } => {
                let instantiated = ty.instantiate(self.map, pack_offset);

                if instantiated == *ty {
                    evaluation.clone()
                } else {
                    evaluation
                        .derive(Binding::Variable { id: *id, ty: instantiated })
                }
            }
        }
    }

    fn instantiate_unary(
        &self,
        evaluation: &Evaluation,
        unary: &Unary,
        pack_offset: Option<usize>,
        depth: usize,
    ) -> Evaluation {
        if unary.operator() == UnaryOperator::SizeofPack {
            match unary.operand().determine_pack_size(self.map) {
                PackSize::Count(count) => {
                    return i128::try_from(count).map_or_else(
                        |_| Evaluation::problem(),
                        |count| {
                            evaluation.derive(Fixed::new(
                                Type::Primitive(Primitive::SIZE_T),
                                Value::Integral(count),
                                ValueCategory::PRValue,
                            ))
                        },
                    );
                }
                PackSize::Defer => {}
                size @ (PackSize::Fail | PackSize::NotFound) => {
                    log::debug!("`sizeof...` of an invalid pack: {size:?}");
                    return Evaluation::problem();
                }
            }
        }

        let operand = self.instantiate(unary.operand(), pack_offset, depth);

        if operand.ptr_eq(unary.operand()) {
            evaluation.clone()
        } else {
            evaluation.derive(Unary::new(unary.operator(), operand))
        }
    }

    fn instantiate_conditional(
        &self,
        evaluation: &Evaluation,
        conditional: &Conditional,
        pack_offset: Option<usize>,
        depth: usize,
    ) -> Evaluation {
        let condition =
            self.instantiate(conditional.condition(), pack_offset, depth);
        let positive =
            self.instantiate(conditional.positive(), pack_offset, depth);
        let negative =
            self.instantiate(conditional.negative(), pack_offset, depth);

        if condition.ptr_eq(conditional.condition())
            && positive.ptr_eq(conditional.positive())
            && negative.ptr_eq(conditional.negative())
        {
            evaluation.clone()
        } else {
            evaluation.derive(Conditional::new(condition, positive, negative))
        }
    }

    fn instantiate_call(
        &self,
        evaluation: &Evaluation,
        call: &FunctionCall,
        pack_offset: Option<usize>,
        depth: usize,
    ) -> Evaluation {
        let callee = self.instantiate(call.callee(), pack_offset, depth);
        let arguments =
            self.instantiate_list(call.arguments(), pack_offset, depth);

        if callee.ptr_eq(call.callee()) && same(&arguments, call.arguments()) {
            return evaluation.clone();
        }

        // with the packs expanded the number of arguments is final, which may
        // leave a single viable candidate
        let callee = match callee.kind() {
            Kind::FunctionSet(set)
                if set.candidates().len() > 1
                    && !arguments
                        .iter()
                        .any(|argument| argument.kind().is_parameter_pack()) =>
            {
                set.resolve(arguments.len(), self.scope).map_or_else(
                    || callee.clone(),
                    |function| {
                        callee.derive(FunctionSet::new(
                            vec![function],
                            set.name().clone(),
                            set.template_arguments().clone(),
                        ))
                    },
                )
            }
            _ => callee.clone(),
        };

        evaluation.derive(FunctionCall::new(callee, arguments))
    }

    fn instantiate_function_set(
        &self,
        evaluation: &Evaluation,
        set: &FunctionSet,
        pack_offset: Option<usize>,
    ) -> Evaluation {
        let candidates = self.members_of(evaluation).map_or_else(
            || set.candidates().clone(),
            |members| {
                set.candidates()
                    .iter()
                    .map(|candidate| {
                        members.get(candidate).copied().unwrap_or(*candidate)
                    })
                    .collect()
            },
        );

        let template_arguments =
            set.template_arguments().as_ref().map(|arguments| {
                pack::instantiate_arguments(arguments, self.map, pack_offset)
            });

        if candidates == *set.candidates()
            && template_arguments == *set.template_arguments()
        {
            evaluation.clone()
        } else {
            evaluation.derive(FunctionSet::new(
                candidates,
                set.name().clone(),
                template_arguments,
            ))
        }
    }

    /// Instantiates a comma separated list, expanding the pack expansions it
    /// contains.
    fn instantiate_list(
        &self,
        list: &[Evaluation],
        pack_offset: Option<usize>,
        depth: usize,
    ) -> Vec<Evaluation> {
        let mut instantiated = Vec::with_capacity(list.len());

        for element in list {
            let Kind::ParameterPack(pack) = element.kind() else {
                instantiated.push(self.instantiate(element, pack_offset, depth));
                continue;
            };

            match element.determine_pack_size(self.map) {
                PackSize::Count(count) => {
                    instantiated.extend((0..count).map(|offset| {
                        self.instantiate(pack.pattern(), Some(offset), depth)
                    }));
                }
                PackSize::Defer => {
                    instantiated
                        .push(self.instantiate(element, pack_offset, depth));
                }
                size @ (PackSize::Fail | PackSize::NotFound) => {
                    log::debug!("pack expansion can't be expanded: {size:?}");
                    instantiated.push(Evaluation::problem());
                }
            }
        }

        instantiated
    }
}
