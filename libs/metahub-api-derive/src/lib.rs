use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, Lit, LitBool, LitInt, LitStr, UnOp,
    ext::IdentExt, meta::ParseNestedMeta, parse_macro_input,
};

/// Derive macro for source schemas.
///
/// Implements `metahub_api::reflect::Describable` and `Reflect` for a struct
/// with named fields. Field metadata comes from `#[hub(...)]`:
///
/// ```ignore
/// #[derive(Describable)]
/// #[hub(target = "Record", preserve_unmapped, name = "bibtex.Entry")]
/// pub struct Entry {
///     #[hub(target = "title", parser = "latex", priority = 2)]
///     pub title: String,
///
///     #[hub(target = "dates", date_type = "issued", parser = "edtf")]
///     pub year: String,
///
///     /// No `#[hub]`: kept in `extra` when `preserve_unmapped` is on.
///     pub cite_key: String,
///
///     #[hub(skip)]
///     pub cache: Vec<u8>,
/// }
/// ```
///
/// String keys: `target`, `date_type`, `identifier_type`, `role`,
/// `contributor_type`, `subject_vocabulary`, `relation_type`, `parser`,
/// `validators`, `pattern`, `delimiter`, `description`.
/// Numeric keys: `min_length`, `max_length`, `min_count`, `max_count`,
/// `min_value`, `max_value`, `priority`. Flags: `required`, `skip`.
///
/// Every field type must implement `Reflect`.
#[proc_macro_derive(Describable, attributes(hub))]
pub fn derive_describable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match describable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derive macro for enum types used as source fields.
///
/// Unit variants only. The ordinal is the explicit discriminant when given,
/// otherwise one past the previous variant. `#[hub(target = "...")]` on a
/// variant declares its canonical name.
#[proc_macro_derive(HubEnum, attributes(hub))]
pub fn derive_hub_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match hub_enum_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn reject_generics(input: &DeriveInput, derive: &str) -> Result<(), syn::Error> {
    if input.generics.params.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            &input.generics,
            format!("{derive} does not support generic types"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Describable
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MessageAttrs {
    target: Option<String>,
    preserve_unmapped: bool,
    name: Option<String>,
}

#[derive(Default)]
struct FieldAttrs {
    annotated: bool,
    skip: bool,
    target: Option<String>,
    strs: Vec<(&'static str, String)>,
    counts: Vec<(&'static str, u64)>,
    bounds: Vec<(&'static str, f64)>,
    required: bool,
    priority: Option<i32>,
}

const STR_KEYS: &[&str] = &[
    "date_type",
    "identifier_type",
    "role",
    "contributor_type",
    "subject_vocabulary",
    "relation_type",
    "parser",
    "validators",
    "pattern",
    "delimiter",
    "description",
];

const COUNT_KEYS: &[&str] = &["min_length", "max_length", "min_count", "max_count"];

const BOUND_KEYS: &[&str] = &["min_value", "max_value"];

fn describable_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    reject_generics(input, "Describable")?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Describable only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Describable only supports structs",
            ));
        }
    };

    let message = parse_message_attrs(input)?;
    let full_name = message.name.unwrap_or_else(|| name.to_string());
    let message_annotation = match message.target {
        Some(target) => {
            let preserve = message.preserve_unmapped;
            quote! {
                Some(metahub_api::reflect::MessageAnnotation {
                    target: #target,
                    preserve_unmapped: #preserve,
                })
            }
        }
        None if message.preserve_unmapped => {
            return Err(syn::Error::new_spanned(
                name,
                "preserve_unmapped requires #[hub(target = \"...\")]",
            ));
        }
        None => quote! { None },
    };

    let mut descriptor_tokens = Vec::new();
    let mut arm_tokens = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let index = descriptor_tokens.len();
        // `r#abstract` is reported as `abstract`.
        let field_name_str = field_name.unraw().to_string();
        let annotation = if attrs.annotated {
            annotation_tokens(&attrs)
        } else {
            quote! { None }
        };
        descriptor_tokens.push(quote! {
            metahub_api::reflect::FieldDescriptor {
                name: #field_name_str,
                annotation: #annotation,
            }
        });
        arm_tokens.push(quote! {
            #index => metahub_api::reflect::Reflect::reflect(&self.#field_name),
        });
    }

    Ok(quote! {
        impl metahub_api::reflect::Describable for #name {
            fn schema() -> &'static metahub_api::reflect::MessageDescriptor
            where
                Self: Sized,
            {
                static DESCRIPTOR: metahub_api::reflect::MessageDescriptor =
                    metahub_api::reflect::MessageDescriptor {
                        full_name: #full_name,
                        annotation: #message_annotation,
                        fields: &[
                            #(#descriptor_tokens),*
                        ],
                    };
                &DESCRIPTOR
            }

            fn descriptor(&self) -> &'static metahub_api::reflect::MessageDescriptor {
                <Self as metahub_api::reflect::Describable>::schema()
            }

            fn field_value(
                &self,
                index: usize,
            ) -> Option<metahub_api::reflect::FieldValue<'_>> {
                match index {
                    #(#arm_tokens)*
                    _ => None,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl metahub_api::reflect::Reflect for #name {
            fn reflect(&self) -> Option<metahub_api::reflect::FieldValue<'_>> {
                Some(metahub_api::reflect::FieldValue::Message(self))
            }
        }
    })
}

fn parse_message_attrs(input: &DeriveInput) -> Result<MessageAttrs, syn::Error> {
    let mut attrs = MessageAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("hub") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("target") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.target = Some(value.value());
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.name = Some(value.value());
            } else if meta.path.is_ident("preserve_unmapped") {
                attrs.preserve_unmapped = parse_flag(&meta)?;
            } else {
                return Err(meta.error("unknown message attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs, syn::Error> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("hub") {
            continue;
        }
        attrs.annotated = true;
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident().map(ToString::to_string) else {
                return Err(meta.error("expected identifier"));
            };
            if ident == "skip" {
                attrs.skip = true;
            } else if ident == "required" {
                attrs.required = parse_flag(&meta)?;
            } else if ident == "target" {
                let value: LitStr = meta.value()?.parse()?;
                attrs.target = Some(value.value());
            } else if ident == "priority" {
                let expr: Expr = meta.value()?.parse()?;
                attrs.priority = Some(int_expr(&expr)?);
            } else if let Some(key) = STR_KEYS.iter().find(|k| **k == ident) {
                let value: LitStr = meta.value()?.parse()?;
                attrs.strs.push((*key, value.value()));
            } else if let Some(key) = COUNT_KEYS.iter().find(|k| **k == ident) {
                let value: LitInt = meta.value()?.parse()?;
                attrs.counts.push((*key, value.base10_parse()?));
            } else if let Some(key) = BOUND_KEYS.iter().find(|k| **k == ident) {
                let expr: Expr = meta.value()?.parse()?;
                attrs.bounds.push((*key, float_expr(&expr)?));
            } else {
                return Err(meta.error(format!("unknown field attribute '{ident}'")));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

/// `flag` or `flag = true|false`.
fn parse_flag(meta: &ParseNestedMeta<'_>) -> Result<bool, syn::Error> {
    if meta.input.peek(syn::Token![=]) {
        let value: LitBool = meta.value()?.parse()?;
        Ok(value.value)
    } else {
        Ok(true)
    }
}

fn int_expr(expr: &Expr) -> Result<i32, syn::Error> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => int_expr(expr).map(|v| -v),
        _ => Err(syn::Error::new_spanned(expr, "expected integer literal")),
    }
}

fn float_expr(expr: &Expr) -> Result<f64, syn::Error> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Float(lit),
            ..
        }) => lit.base10_parse(),
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<i64>().map(|v| v as f64),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => float_expr(expr).map(|v| -v),
        _ => Err(syn::Error::new_spanned(expr, "expected numeric literal")),
    }
}

fn annotation_tokens(attrs: &FieldAttrs) -> TokenStream2 {
    let target = attrs.target.clone().unwrap_or_default();
    let required = attrs.required;

    let strs = attrs.strs.iter().map(|(key, value)| {
        let key = syn::Ident::new(key, proc_macro2::Span::call_site());
        quote! { #key: Some(#value), }
    });
    let counts = attrs.counts.iter().map(|(key, value)| {
        let key = syn::Ident::new(key, proc_macro2::Span::call_site());
        quote! { #key: Some(#value), }
    });
    let bounds = attrs.bounds.iter().map(|(key, value)| {
        let key = syn::Ident::new(key, proc_macro2::Span::call_site());
        quote! { #key: Some(#value), }
    });
    let priority = attrs.priority.map(|p| quote! { priority: Some(#p), });

    quote! {
        Some(metahub_api::reflect::FieldAnnotation {
            target: #target,
            #(#strs)*
            #(#counts)*
            #(#bounds)*
            #priority
            required: #required,
            ..metahub_api::reflect::FieldAnnotation::EMPTY
        })
    }
}

// ---------------------------------------------------------------------------
// HubEnum
// ---------------------------------------------------------------------------

fn hub_enum_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    reject_generics(input, "HubEnum")?;

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "HubEnum only supports enums"));
    };

    let mut type_name = name.to_string();
    for attr in &input.attrs {
        if !attr.path().is_ident("hub") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                type_name = value.value();
                Ok(())
            } else {
                Err(meta.error("unknown enum attribute"))
            }
        })?;
    }

    let mut value_tokens = Vec::new();
    let mut ordinal_arms = Vec::new();
    let mut next: i32 = 0;

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "HubEnum only supports unit variants",
            ));
        }
        let ordinal = match &variant.discriminant {
            Some((_, expr)) => int_expr(expr)?,
            None => next,
        };
        next = ordinal + 1;

        let mut target: Option<String> = None;
        for attr in &variant.attrs {
            if !attr.path().is_ident("hub") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("target") {
                    let value: LitStr = meta.value()?.parse()?;
                    target = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown variant attribute"))
                }
            })?;
        }

        let ident = &variant.ident;
        let ident_str = ident.to_string();
        let target = match target {
            Some(t) => quote! { Some(#t) },
            None => quote! { None },
        };
        value_tokens.push(quote! {
            metahub_api::reflect::EnumValueAnnotation {
                ordinal: #ordinal,
                name: #ident_str,
                target: #target,
            }
        });
        ordinal_arms.push(quote! { Self::#ident => #ordinal, });
    }

    let count = value_tokens.len();

    Ok(quote! {
        impl metahub_api::reflect::HubEnum for #name {
            const TYPE_NAME: &'static str = #type_name;

            fn values() -> &'static [metahub_api::reflect::EnumValueAnnotation] {
                static VALUES: [metahub_api::reflect::EnumValueAnnotation; #count] = [
                    #(#value_tokens),*
                ];
                &VALUES
            }

            fn ordinal(&self) -> i32 {
                match self {
                    #(#ordinal_arms)*
                }
            }
        }

        impl metahub_api::reflect::Reflect for #name {
            fn reflect(&self) -> Option<metahub_api::reflect::FieldValue<'_>> {
                Some(metahub_api::reflect::FieldValue::Enum(
                    metahub_api::reflect::HubEnum::enum_ref(self),
                ))
            }
        }
    })
}
