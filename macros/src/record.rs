use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse_quote, spanned::Spanned, Data, DeriveInput, Error, Field, Fields, Index, Lit, Meta,
    NestedMeta, Visibility,
};

/// One declared field of the deriving struct.
struct Declared {
    name: String,
    tag: Option<String>,
    exported: bool,
    anonymous: bool,
    access: TokenStream,
}

impl Declared {
    /// Named `pub` fields are the only ones the engines reach.
    fn traversed(&self) -> bool {
        self.exported && !self.anonymous
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream, Error> {
    let fields = match &input.data {
        Data::Struct(data) => declare(&data.fields)?,
        Data::Enum(data) => {
            return Err(Error::new(
                data.enum_token.span(),
                "Record can only be derived for structs",
            ))
        }
        Data::Union(data) => {
            return Err(Error::new(
                data.union_token.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let ident = &input.ident;
    let decls = fields.iter().map(|field| {
        let name = &field.name;
        let tag = match &field.tag {
            Some(tag) => quote!(::core::option::Option::Some(#tag)),
            None => quote!(::core::option::Option::None),
        };
        let exported = field.exported;
        let anonymous = field.anonymous;
        quote! {
            ::objwire_codec::FieldDecl {
                name: #name,
                tag: #tag,
                exported: #exported,
                anonymous: #anonymous,
            }
        }
    });

    let traversed: Vec<(usize, &Declared)> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.traversed())
        .collect();
    let indices: Vec<usize> = traversed.iter().map(|(index, _)| *index).collect();
    let accesses: Vec<&TokenStream> = traversed.iter().map(|(_, field)| &field.access).collect();

    // Only type parameters are bounded: field types may refer back to the record itself.
    let mut record_generics = input.generics.clone();
    let params: Vec<_> = record_generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    {
        let clause = record_generics.make_where_clause();
        clause.predicates.push(parse_quote!(Self: 'static));
        for param in &params {
            clause.predicates.push(parse_quote!(
                #param: ::objwire_codec::Encode + ::objwire_codec::Decode + ::core::default::Default
            ));
        }
    }
    let (impl_generics, ty_generics, record_where) = record_generics.split_for_impl();

    let mut decode_generics = record_generics.clone();
    decode_generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(Self: ::core::default::Default));
    let (_, _, decode_where) = decode_generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::objwire_codec::Record for #ident #ty_generics #record_where {
            const FIELDS: &'static [::objwire_codec::FieldDecl] = &[#(#decls),*];

            fn field(
                &self,
                index: usize,
            ) -> ::core::option::Option<&dyn ::objwire_codec::Encode> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#accesses),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::objwire_codec::Decode> {
                match index {
                    #(#indices => ::core::option::Option::Some(&mut self.#accesses),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::objwire_codec::Encode for #ident #ty_generics #record_where {
            fn encode(
                &self,
                enc: &mut ::objwire_codec::Encoder<'_>,
            ) -> ::core::result::Result<(), ::objwire_codec::Error> {
                enc.encode_record(self)
            }

            fn is_zero_value(&self) -> bool {
                true #(&& ::objwire_codec::Encode::is_zero_value(&self.#accesses))*
            }
        }

        impl #impl_generics ::objwire_codec::Decode for #ident #ty_generics #decode_where {
            fn decode(
                &mut self,
                dec: &mut ::objwire_codec::Decoder<'_>,
            ) -> ::core::result::Result<(), ::objwire_codec::Error> {
                dec.decode_record(self)
            }

            fn shape() -> ::objwire_codec::Shape {
                ::objwire_codec::Shape::Record
            }
        }
    })
}

fn declare(fields: &Fields) -> Result<Vec<Declared>, Error> {
    let anonymous = matches!(fields, Fields::Unnamed(_));
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (name, access) = match &field.ident {
                Some(ident) => (ident.to_string(), quote!(#ident)),
                None => {
                    let index = Index::from(index);
                    (index.index.to_string(), quote!(#index))
                }
            };
            Ok(Declared {
                name,
                tag: tag(field)?,
                exported: matches!(field.vis, Visibility::Public(_)),
                anonymous,
                access,
            })
        })
        .collect()
}

/// Reads the `#[wire("...")]` attribute of a field.
fn tag(field: &Field) -> Result<Option<String>, Error> {
    let mut found = None;
    for attr in field.attrs.iter().filter(|attr| attr.path.is_ident("wire")) {
        if found.is_some() {
            return Err(Error::new(attr.span(), "duplicate `wire` attribute"));
        }
        let list = match attr.parse_meta()? {
            Meta::List(list) if list.nested.len() == 1 => list,
            other => {
                return Err(Error::new(
                    other.span(),
                    "expected `#[wire(\"name,flags\")]`",
                ))
            }
        };
        match list.nested.first() {
            Some(NestedMeta::Lit(Lit::Str(lit))) => found = Some(lit.value()),
            _ => {
                return Err(Error::new(
                    list.nested.span(),
                    "the wire tag must be a string literal",
                ))
            }
        }
    }
    Ok(found)
}
