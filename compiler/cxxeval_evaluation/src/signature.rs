//! Implements the canonical encoding of evaluations.
//!
//! Two trees built independently from the same construction receive the same
//! [`Signature`](cxxeval_term::signature::Signature); any structural
//! difference, including a different template definition, yields a different
//! one.

use cxxeval_term::signature::{Marshal, SignatureBuffer};

use crate::{
    kind::{
        ArithmeticOperator, BinaryOperator, Binding, Kind, TypeOperator,
        UnaryOperator,
    },
    stack::ensure_sufficient_stack,
    Evaluation,
};

impl Marshal for UnaryOperator {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        buffer.put_tag(match self {
            Self::Plus => 0,
            Self::Minus => 1,
            Self::BitwiseNot => 2,
            Self::LogicalNot => 3,
            Self::Dereference => 4,
            Self::AddressOf => 5,
            Self::PreIncrement => 6,
            Self::PreDecrement => 7,
            Self::PostIncrement => 8,
            Self::PostDecrement => 9,
            Self::SizeofPack => 10,
        });
    }
}

impl Marshal for ArithmeticOperator {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        buffer.put_tag(match self {
            Self::Add => 0,
            Self::Subtract => 1,
            Self::Multiply => 2,
            Self::Divide => 3,
            Self::Modulo => 4,
            Self::ShiftLeft => 5,
            Self::ShiftRight => 6,
            Self::BitwiseAnd => 7,
            Self::BitwiseOr => 8,
            Self::BitwiseXor => 9,
        });
    }
}

impl Marshal for BinaryOperator {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        let tag = match self {
            Self::Add => 0,
            Self::Subtract => 1,
            Self::Multiply => 2,
            Self::Divide => 3,
            Self::Modulo => 4,
            Self::ShiftLeft => 5,
            Self::ShiftRight => 6,
            Self::BitwiseAnd => 7,
            Self::BitwiseOr => 8,
            Self::BitwiseXor => 9,
            Self::Less => 10,
            Self::LessEqual => 11,
            Self::Greater => 12,
            Self::GreaterEqual => 13,
            Self::Equal => 14,
            Self::NotEqual => 15,
            Self::LogicalAnd => 16,
            Self::LogicalOr => 17,
            Self::Assign => 18,
            Self::CompoundAssign(operator) => {
                buffer.put_tag(19);
                operator.marshal(buffer);
                return;
            }
        };

        buffer.put_tag(tag);
    }
}

impl Marshal for TypeOperator {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        buffer.put_tag(match self {
            Self::SizeOf => 0,
            Self::AlignOf => 1,
            Self::IsIntegral => 2,
            Self::IsSigned => 3,
            Self::IsPointer => 4,
        });
    }
}

impl Marshal for Binding {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        match self {
            Self::TemplateParameter { parameter, ty } => {
                buffer.put_tag(0);
                parameter.marshal(buffer);
                ty.marshal(buffer);
            }
            Self::FunctionParameter { position, ty, is_pack } => {
                buffer.put_tag(1);
                buffer.put_usize(*position);
                ty.marshal(buffer);
                buffer.put_bool(*is_pack);
            }
            Self::Variable { id, ty } => {
                buffer.put_tag(2);
                id.marshal(buffer);
                ty.marshal(buffer);
            }
        }
    }
}

impl Marshal for Kind {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        match self {
            Self::Fixed(fixed) => {
                buffer.put_tag(0);
                fixed.ty().marshal(buffer);
                fixed.value().marshal(buffer);
                fixed.category().marshal(buffer);
            }
            Self::Binding(binding) => {
                buffer.put_tag(1);
                binding.marshal(buffer);
            }
            Self::Unary(unary) => {
                buffer.put_tag(2);
                unary.operator().marshal(buffer);
                unary.operand().marshal(buffer);
            }
            Self::Binary(binary) => {
                buffer.put_tag(3);
                binary.operator().marshal(buffer);
                binary.lhs().marshal(buffer);
                binary.rhs().marshal(buffer);
            }
            Self::UnaryTypeId(type_id) => {
                buffer.put_tag(4);
                type_id.operator().marshal(buffer);
                type_id.ty().marshal(buffer);
            }
            Self::Conditional(conditional) => {
                buffer.put_tag(5);
                conditional.condition().marshal(buffer);
                conditional.positive().marshal(buffer);
                conditional.negative().marshal(buffer);
            }
            Self::Comma(comma) => {
                buffer.put_tag(6);
                buffer.put_sequence(comma.expressions().iter());
            }
            Self::FunctionCall(call) => {
                buffer.put_tag(7);
                call.callee().marshal(buffer);
                buffer.put_sequence(call.arguments().iter());
            }
            Self::FunctionSet(set) => {
                buffer.put_tag(8);
                buffer.put_sequence(set.candidates().iter());
                buffer.put_str(set.name());
                match set.template_arguments() {
                    Some(arguments) => {
                        buffer.put_tag(1);
                        buffer.put_sequence(arguments.iter());
                    }
                    None => buffer.put_tag(0),
                }
            }
            Self::InitializerList(list) => {
                buffer.put_tag(9);
                buffer.put_sequence(list.clauses().iter());
            }
            Self::TypeId(type_id) => {
                buffer.put_tag(10);
                type_id.ty().marshal(buffer);
                buffer.put_sequence(type_id.arguments().iter());
            }
            Self::ParameterPack(pack) => {
                buffer.put_tag(11);
                pack.pattern().marshal(buffer);
            }
        }
    }
}

impl Marshal for Evaluation {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        ensure_sufficient_stack(|| {
            self.kind().marshal(buffer);
            buffer.put_option(self.template_definition().as_ref());
        });
    }
}
