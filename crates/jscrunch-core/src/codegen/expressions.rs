use super::{format_number, is_bare_key, precedence_of, quote_string, CodeGenerator};
use crate::ast::precedence::needs_parens;
use crate::ast::*;

impl CodeGenerator<'_> {
    /// Emits `expr` into a slot described by `ctx`, parenthesizing when the
    /// slot binds tighter than the expression.
    pub(super) fn generate_expression(&mut self, expr: &Expression, ctx: ParenContext) {
        let prec = precedence_of(expr, self.settings);
        let op = expr.binary_op();
        let forced = self.no_in && op == Some(BinaryOp::In);
        if forced || needs_parens(prec, op, ctx) {
            let saved = std::mem::replace(&mut self.no_in, false);
            self.write("(");
            self.generate_expression_kind(expr);
            self.write(")");
            self.no_in = saved;
        } else {
            self.generate_expression_kind(expr);
        }
    }

    fn generate_expression_kind(&mut self, expr: &Expression) {
        match &expr.kind {
            ExpressionKind::Number(value) => self.write(&format_number(*value)),
            ExpressionKind::String(value) => self.write(&quote_string(value)),
            ExpressionKind::Regex { pattern, flags } => {
                self.write(&format!("/{}/{}", pattern, flags))
            }
            ExpressionKind::Boolean(value) => self.generate_boolean(*value),
            ExpressionKind::Null => self.write("null"),
            ExpressionKind::This => self.write("this"),
            ExpressionKind::Identifier(ident) => {
                let name = self.identifier_name(ident);
                self.write(name);
            }
            ExpressionKind::Array(elements) => self.generate_array(elements),
            ExpressionKind::Object(properties) => self.generate_object(properties),
            ExpressionKind::Function(func) => self.generate_function(func),
            ExpressionKind::Member(object, name) => {
                self.generate_member_object(object);
                self.write(".");
                self.write(name);
            }
            ExpressionKind::Index(object, index) => {
                self.generate_member_object(object);
                self.write("[");
                self.generate_expression(index, ParenContext::TOP);
                self.write("]");
            }
            ExpressionKind::Call(callee, args) => {
                self.generate_expression(callee, ParenContext::MEMBER_OBJECT);
                self.generate_arguments(args);
            }
            ExpressionKind::New(callee, args) => {
                self.write("new");
                if contains_call(callee) {
                    let saved = std::mem::replace(&mut self.no_in, false);
                    self.write("(");
                    self.generate_expression(callee, ParenContext::TOP);
                    self.write(")");
                    self.no_in = saved;
                } else {
                    self.generate_expression(callee, ParenContext::MEMBER_OBJECT);
                }
                if let Some(args) = args {
                    self.generate_arguments(args);
                }
            }
            ExpressionKind::Unary(op, operand) => {
                self.write(op.as_str());
                self.generate_expression(operand, ParenContext::UNARY);
            }
            ExpressionKind::Update {
                op,
                prefix,
                operand,
            } => {
                if *prefix {
                    self.write(op.as_str());
                    self.generate_expression(operand, ParenContext::MEMBER_OBJECT);
                } else {
                    self.generate_expression(operand, ParenContext::MEMBER_OBJECT);
                    self.write(op.as_str());
                }
            }
            ExpressionKind::Binary(op, left, right) => {
                self.generate_expression(left, ParenContext::binary(*op, Side::Left));
                if *op == BinaryOp::Comma {
                    self.write(",");
                    self.space();
                } else {
                    self.space();
                    self.write(op.as_str());
                    self.space();
                }
                self.generate_expression(right, ParenContext::binary(*op, Side::Right));
            }
            ExpressionKind::Conditional(test, consequent, alternate) => {
                self.generate_expression(test, ParenContext::CONDITIONAL_TEST);
                self.space();
                self.write("?");
                self.space();
                self.generate_expression(consequent, ParenContext::CONDITIONAL_BRANCH);
                self.space();
                self.write(":");
                self.space();
                self.generate_expression(alternate, ParenContext::CONDITIONAL_BRANCH);
            }
        }
    }

    fn generate_boolean(&mut self, value: bool) {
        if self.settings.minify_booleans() {
            self.write(if value { "!0" } else { "!1" });
        } else {
            self.write(if value { "true" } else { "false" });
        }
    }

    /// The object of `a.b`, `a[b]` or a call. An integer literal needs a
    /// second dot so the first one is not read as a decimal point.
    fn generate_member_object(&mut self, object: &Expression) {
        if let ExpressionKind::Number(value) = object.kind {
            let text = format_number(value);
            if text.bytes().all(|b| b.is_ascii_digit()) {
                self.write(&text);
                self.write(".");
                return;
            }
        }
        self.generate_expression(object, ParenContext::MEMBER_OBJECT);
    }

    fn generate_arguments(&mut self, args: &[Expression]) {
        self.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            self.generate_expression(arg, ParenContext::LIST_ITEM);
        }
        self.write(")");
    }

    fn generate_array(&mut self, elements: &[Option<Expression>]) {
        self.write("[");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            if let Some(element) = element {
                self.generate_expression(element, ParenContext::LIST_ITEM);
            }
        }
        // A trailing hole needs its own comma or the array loses a slot.
        if matches!(elements.last(), Some(None)) {
            self.write(",");
        }
        self.write("]");
    }

    fn generate_object(&mut self, properties: &[ObjectProperty]) {
        self.write("{");
        for (i, property) in properties.iter().enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            match property.kind {
                PropertyKind::Init => {
                    self.generate_property_key(&property.key);
                    self.write(":");
                    self.space();
                    self.generate_expression(&property.value, ParenContext::LIST_ITEM);
                }
                PropertyKind::Get | PropertyKind::Set => {
                    self.write(if property.kind == PropertyKind::Get {
                        "get"
                    } else {
                        "set"
                    });
                    self.generate_property_key(&property.key);
                    if let ExpressionKind::Function(func) = &property.value.kind {
                        self.generate_function_tail(func);
                    }
                }
            }
        }
        self.write("}");
    }

    fn generate_property_key(&mut self, key: &PropertyKey) {
        match key {
            PropertyKey::Identifier(name) => self.write(name),
            PropertyKey::String(value) if is_bare_key(value) => self.write(value),
            PropertyKey::String(value) => self.write(&quote_string(value)),
            PropertyKey::Number(value) => self.write(&format_number(*value)),
        }
    }

    pub(super) fn generate_function(&mut self, func: &FunctionNode) {
        self.write("function");
        if let Some(name) = &func.name {
            let name = self.identifier_name(name);
            self.write(name);
        }
        self.generate_function_tail(func);
    }

    fn generate_function_tail(&mut self, func: &FunctionNode) {
        self.write("(");
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            let name = self.identifier_name(param);
            self.write(name);
        }
        self.write(")");
        let saved = std::mem::replace(&mut self.no_in, false);
        self.open_brace();
        self.generate_statement_list(&func.body.statements);
        self.close_brace();
        self.no_in = saved;
    }
}

/// Whether the member chain of a `new` callee contains a call, which would
/// otherwise be taken as the constructor's argument list.
fn contains_call(callee: &Expression) -> bool {
    match &callee.kind {
        ExpressionKind::Call(..) => true,
        ExpressionKind::Member(object, _) | ExpressionKind::Index(object, _) => {
            contains_call(object)
        }
        _ => false,
    }
}
