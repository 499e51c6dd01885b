//! Parsers for type declarations, types, units and literal values.
//!
//! All of them share one recursive-descent [`Parser`] over the token stream
//! from [`tokenize`]. Syntax errors carry the line of the offending token;
//! literals that are well formed but do not fit the expected type are
//! [`GridtypesError::Literal`].

use gridtypes_engine::types::{
    DataType, DateTimeFormats, DateTimeType, FlexibleParse, TagType, TemporalValue, TypeId,
};
use gridtypes_engine::units::SingleUnit;
use gridtypes_engine::value::{CellValue, NumberValue};

use super::lexer::{Token, TokenKind, tokenize};
use crate::error::{GridtypesError, Result};
use crate::registry::{TaggedTypeDefinition, TypeArgExpr, TypeExpr, TypeVarDecl, UnitExpr, UnitTerm};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Parser> {
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> GridtypesError {
        GridtypesError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            None => "end of input".to_string(),
            Some(TokenKind::Ident(s)) => format!("'{}'", s),
            Some(TokenKind::Marker(s)) => format!("'@{}'", s),
            Some(TokenKind::Number(s)) => format!("number {}", s),
            Some(TokenKind::Str(s)) => format!("string \"{}\"", s),
            Some(TokenKind::Arrow) => "'->'".to_string(),
            Some(TokenKind::Punct(c)) => format!("'{}'", c),
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&TokenKind::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}' but found {}", c, self.describe_next())))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(TokenKind::Ident(s)) if s == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {} but found {}", keyword, self.describe_next())))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(TokenKind::Ident(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.error(format!("Expected a name but found {}", self.describe_next()))),
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error(format!("Unexpected {}", self.describe_next())))
        }
    }

    fn declaration(&mut self) -> Result<TaggedTypeDefinition> {
        self.expect_keyword("TYPE")?;
        let name = self.expect_ident()?;

        let mut type_vars = Vec::new();
        if self.eat_punct('(') {
            loop {
                type_vars.push(self.type_var()?);
                if !self.eat_punct(',') {
                    break;
                }
            }
            self.expect_punct(')')?;
        }

        self.expect_keyword("TAGGED")?;
        let mut tags = vec![self.tag()?];
        while self.eat_punct('|') {
            tags.push(self.tag()?);
        }

        TaggedTypeDefinition::new(TypeId::from(name), type_vars, tags)
    }

    fn type_var(&mut self) -> Result<TypeVarDecl> {
        let is_unit = match self.peek() {
            Some(TokenKind::Marker(m)) if m == "TYPEVAR" => false,
            Some(TokenKind::Marker(m)) if m == "UNITVAR" => true,
            _ => {
                return Err(self.error(format!(
                    "Expected @TYPEVAR or @UNITVAR but found {}",
                    self.describe_next()
                )));
            }
        };
        self.pos += 1;
        let name = self.expect_ident()?;
        Ok(if is_unit {
            TypeVarDecl::Unit(name)
        } else {
            TypeVarDecl::Type(name)
        })
    }

    fn tag(&mut self) -> Result<TagType<TypeExpr>> {
        let name = self.expect_ident()?;
        let inner = if self.eat_punct('(') {
            let inner = self.type_expr()?;
            self.expect_punct(')')?;
            Some(inner)
        } else {
            None
        };
        Ok(TagType::new(&name, inner))
    }

    fn type_expr(&mut self) -> Result<TypeExpr> {
        let line = self.line();
        let Some(token) = self.advance() else {
            return Err(self.error("Expected a type but found end of input"));
        };
        match token {
            TokenKind::Ident(kw) => match kw.as_str() {
                "NUMBER" => {
                    let min_dp = match self.peek() {
                        Some(TokenKind::Number(n)) => {
                            let min_dp = n.parse::<u8>().map_err(|_| {
                                self.error(format!("Invalid decimal places: {}", n))
                            })?;
                            self.pos += 1;
                            min_dp
                        }
                        _ => 0,
                    };
                    let unit = if self.eat_punct('{') {
                        let unit = self.unit()?;
                        self.expect_punct('}')?;
                        unit
                    } else {
                        UnitExpr::scalar()
                    };
                    Ok(TypeExpr::Number { unit, min_dp })
                }
                "TEXT" => Ok(TypeExpr::Text),
                "BOOLEAN" => Ok(TypeExpr::Boolean),
                "DATETIME" => {
                    let granularity = self.expect_ident()?;
                    DateTimeType::from_keyword(&granularity)
                        .map(TypeExpr::DateTime)
                        .ok_or_else(|| GridtypesError::Parse {
                            line,
                            message: format!("Unknown date/time granularity: {}", granularity),
                        })
                }
                "TAGGED" => {
                    let name = self.expect_ident()?;
                    let mut args = Vec::new();
                    if self.eat_punct('<') {
                        loop {
                            args.push(self.type_arg()?);
                            if !self.eat_punct(',') {
                                break;
                            }
                        }
                        self.expect_punct('>')?;
                    }
                    Ok(TypeExpr::Tagged {
                        name: TypeId::from(name),
                        args,
                    })
                }
                "FUNCTION" => {
                    self.expect_punct('(')?;
                    let arg = self.type_expr()?;
                    if self.peek() != Some(&TokenKind::Arrow) {
                        return Err(self.error(format!("Expected '->' but found {}", self.describe_next())));
                    }
                    self.pos += 1;
                    let result = self.type_expr()?;
                    self.expect_punct(')')?;
                    Ok(TypeExpr::Function(Box::new(arg), Box::new(result)))
                }
                other => Err(GridtypesError::Parse {
                    line,
                    message: format!("Unknown type keyword: {}", other),
                }),
            },
            TokenKind::Marker(m) if m == "TYPEVAR" => Ok(TypeExpr::Var(self.expect_ident()?)),
            TokenKind::Punct('(') => {
                let mut members = vec![self.type_expr()?];
                while self.eat_punct(',') {
                    members.push(self.type_expr()?);
                }
                self.expect_punct(')')?;
                if members.len() < 2 {
                    return Err(GridtypesError::Parse {
                        line,
                        message: "A tuple needs at least two members".to_string(),
                    });
                }
                Ok(TypeExpr::Tuple(members))
            }
            TokenKind::Punct('[') => {
                if self.eat_punct(']') {
                    return Ok(TypeExpr::Array(None));
                }
                let element = self.type_expr()?;
                self.expect_punct(']')?;
                Ok(TypeExpr::Array(Some(Box::new(element))))
            }
            _ => {
                self.pos -= 1;
                Err(self.error(format!("Expected a type but found {}", self.describe_next())))
            }
        }
    }

    fn type_arg(&mut self) -> Result<TypeArgExpr> {
        if self.eat_punct('{') {
            let unit = self.unit()?;
            self.expect_punct('}')?;
            Ok(TypeArgExpr::Unit(unit))
        } else {
            Ok(TypeArgExpr::Type(self.type_expr()?))
        }
    }

    fn unit(&mut self) -> Result<UnitExpr> {
        let mut terms = Vec::new();
        if self.peek() == Some(&TokenKind::Number("1".to_string())) {
            self.pos += 1;
        } else {
            terms.push(self.unit_term()?);
        }
        loop {
            if self.eat_punct('*') {
                terms.push(self.unit_term()?);
            } else if self.eat_punct('/') {
                let (term, power) = self.unit_term()?;
                let power = power
                    .checked_neg()
                    .ok_or_else(|| self.error(format!("Unit power out of range: {}", power)))?;
                terms.push((term, power));
            } else {
                break;
            }
        }
        UnitExpr::from_terms(terms).map_err(|err| self.error(err.to_string()))
    }

    fn unit_term(&mut self) -> Result<(UnitTerm, i32)> {
        let term = match self.peek() {
            Some(TokenKind::Marker(m)) if m == "UNITVAR" => {
                self.pos += 1;
                UnitTerm::Var(self.expect_ident()?)
            }
            Some(TokenKind::Ident(_)) => UnitTerm::Named(SingleUnit::new(&self.expect_ident()?)),
            _ => return Err(self.error(format!("Expected a unit but found {}", self.describe_next()))),
        };
        let power = if self.eat_punct('^') {
            let Some(TokenKind::Number(n)) = self.peek() else {
                return Err(self.error(format!("Expected a power but found {}", self.describe_next())));
            };
            let power = n
                .parse::<i32>()
                .map_err(|_| self.error(format!("Invalid unit power: {}", n)))?;
            self.pos += 1;
            power
        } else {
            1
        };
        Ok((term, power))
    }

    fn value(&mut self, data_type: &DataType, formats: &DateTimeFormats) -> Result<CellValue> {
        match data_type {
            DataType::Number(_) => match self.advance() {
                Some(TokenKind::Number(n)) => NumberValue::parse(&n)
                    .map(CellValue::Number)
                    .ok_or_else(|| GridtypesError::Literal(format!("Invalid number: {}", n))),
                _ => Err(self.mismatch(data_type)),
            },
            DataType::Text => match self.advance() {
                Some(TokenKind::Str(s)) => Ok(CellValue::Text(s)),
                _ => Err(self.mismatch(data_type)),
            },
            DataType::Boolean => match self.advance() {
                Some(TokenKind::Ident(s)) if s == "true" => Ok(CellValue::Boolean(true)),
                Some(TokenKind::Ident(s)) if s == "false" => Ok(CellValue::Boolean(false)),
                _ => Err(self.mismatch(data_type)),
            },
            DataType::DateTime(info) => match self.advance() {
                Some(TokenKind::Str(s)) => parse_temporal(&s, info.granularity, formats).map(CellValue::Temporal),
                _ => Err(self.mismatch(data_type)),
            },
            DataType::Tagged(_) => {
                let name = match self.advance() {
                    Some(TokenKind::Ident(s)) | Some(TokenKind::Str(s)) => s,
                    _ => return Err(self.mismatch(data_type)),
                };
                let tags = data_type.tags()?;
                let Some(index) = tags.iter().position(|t| t.name == name) else {
                    return Err(GridtypesError::Literal(format!(
                        "Unknown tag {} for type {}",
                        name,
                        data_type.to_display(true)
                    )));
                };
                match &tags[index].inner {
                    Some(inner_type) => {
                        self.expect_punct('(')?;
                        let inner = self.value(inner_type, formats)?;
                        self.expect_punct(')')?;
                        Ok(CellValue::tagged(index, Some(inner)))
                    }
                    None => Ok(CellValue::tagged(index, None)),
                }
            }
            DataType::Tuple(members) => {
                self.expect_punct('(')?;
                let mut values = Vec::with_capacity(members.len());
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        self.expect_punct(',')?;
                    }
                    values.push(self.value(member, formats)?);
                }
                self.expect_punct(')')?;
                Ok(CellValue::Tuple(values))
            }
            DataType::Array(element) => {
                self.expect_punct('[')?;
                let mut items = Vec::new();
                if !self.eat_punct(']') {
                    let Some(element) = element else {
                        return Err(GridtypesError::Literal(
                            "The empty array type only holds []".to_string(),
                        ));
                    };
                    loop {
                        items.push(self.value(element, formats)?);
                        if !self.eat_punct(',') {
                            break;
                        }
                    }
                    self.expect_punct(']')?;
                }
                Ok(CellValue::Array(items))
            }
            DataType::Function(_, _) => Err(GridtypesError::Literal(
                "Function values cannot be written as literals".to_string(),
            )),
        }
    }

    fn mismatch(&self, data_type: &DataType) -> GridtypesError {
        GridtypesError::Literal(format!(
            "Expected a {} value near line {}",
            data_type,
            self.line()
        ))
    }
}

fn parse_temporal(
    text: &str,
    granularity: DateTimeType,
    formats: &DateTimeFormats,
) -> Result<TemporalValue> {
    let formats = formats.for_type(granularity);
    if let Some(value) = formats.parse_strict(text) {
        return Ok(value);
    }
    match formats.parse_flexible(text) {
        FlexibleParse::Unique(value) => Ok(value),
        FlexibleParse::Ambiguous(candidates) => {
            let readings: Vec<String> = candidates.iter().map(|c| c.value.to_string()).collect();
            Err(GridtypesError::Literal(format!(
                "Ambiguous {} \"{}\": could be {}",
                granularity,
                text,
                readings.join(" or ")
            )))
        }
        FlexibleParse::NoMatch => Err(GridtypesError::Literal(format!(
            "Not a valid {}: \"{}\"",
            granularity, text
        ))),
    }
}

/// Parse a file of `TYPE ... TAGGED ...` declarations.
pub fn parse_declarations(input: &str) -> Result<Vec<TaggedTypeDefinition>> {
    let mut parser = Parser::new(input)?;
    let mut definitions = Vec::new();
    while !parser.at_end() {
        definitions.push(parser.declaration()?);
    }
    Ok(definitions)
}

/// Parse a single type, e.g. `(NUMBER {m}, [TEXT])`.
pub fn parse_type(input: &str) -> Result<TypeExpr> {
    let mut parser = Parser::new(input)?;
    let expr = parser.type_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a unit, with or without surrounding braces: `kg*m/s^2`, `{1/s}`.
pub fn parse_unit(input: &str) -> Result<UnitExpr> {
    let mut parser = Parser::new(input)?;
    let braced = parser.eat_punct('{');
    let unit = parser.unit()?;
    if braced {
        parser.expect_punct('}')?;
    }
    parser.expect_end()?;
    Ok(unit)
}

/// Parse a literal of the given type.
pub fn parse_value(input: &str, data_type: &DataType, formats: &DateTimeFormats) -> Result<CellValue> {
    let mut parser = Parser::new(input)?;
    let value = parser.value(data_type, formats)?;
    parser.expect_end()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gridtypes_engine::units::Unit;
    use indoc::indoc;

    use crate::registry::TypeManager;

    fn number() -> TypeExpr {
        TypeExpr::Number {
            unit: UnitExpr::scalar(),
            min_dp: 0,
        }
    }

    #[test]
    fn test_parse_declarations() {
        let defs = parse_declarations(indoc! {"
            # shapes
            TYPE Shape TAGGED Circle(NUMBER) | Square(NUMBER) | Point
            TYPE Pair(@TYPEVAR a, @UNITVAR u)
                TAGGED Both((@TYPEVAR a, NUMBER 2 {@UNITVAR u/s}))
        "})
        .unwrap();

        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name().as_str(), "Shape");
        assert_eq!(
            defs[0].tags(),
            &[
                TagType::new("Circle", Some(number())),
                TagType::new("Square", Some(number())),
                TagType::new("Point", None),
            ]
        );
        assert_eq!(
            defs[1].type_vars(),
            &[TypeVarDecl::Type("a".to_string()), TypeVarDecl::Unit("u".to_string())]
        );
    }

    #[test]
    fn test_parse_type_every_kind() {
        let expr = parse_type(
            "([NUMBER 1 {m/s^2}], TEXT, BOOLEAN, DATETIME YEARMONTH, TAGGED Optional<TEXT>, [], FUNCTION(TEXT -> BOOLEAN))",
        )
        .unwrap();
        let TypeExpr::Tuple(members) = expr else {
            panic!("Expected tuple");
        };
        assert_eq!(members.len(), 7);
        assert_eq!(
            members[0],
            TypeExpr::Array(Some(Box::new(TypeExpr::Number {
                unit: UnitExpr::from_unit(
                    &Unit::single("m")
                        .divide_by(&Unit::single("s").raise_by(2).unwrap())
                        .unwrap()
                ),
                min_dp: 1,
            })))
        );
        assert_eq!(members[3], TypeExpr::DateTime(DateTimeType::YearMonth));
        assert_eq!(members[5], TypeExpr::Array(None));
    }

    #[test]
    fn test_single_member_tuple_rejected() {
        let err = parse_type("(TEXT)").unwrap_err();
        assert!(matches!(err, GridtypesError::Parse { .. }));
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_declarations("TYPE A TAGGED X\n\nTYPE B TAGGED Y(NUMBR)").unwrap_err();
        match err {
            GridtypesError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("NUMBR"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unit_forms() {
        assert_eq!(parse_unit("1").unwrap(), UnitExpr::scalar());
        assert_eq!(
            parse_unit("{1/s}").unwrap().to_unit().unwrap(),
            Unit::single("s").reciprocal().unwrap()
        );
        assert_eq!(parse_unit("kg*m/s^2").unwrap().to_string(), "kg*m/s^2");
        assert_eq!(parse_unit("m*m/s").unwrap().to_string(), "m^2/s");
        assert!(parse_unit("m^").is_err());
    }

    #[test]
    fn test_parse_unit_power_out_of_range() {
        for text in ["m^2147483647*m", "m/s^-2147483648", "m^-2147483648/m", "m^2147483648"] {
            let err = parse_unit(text).unwrap_err();
            assert!(matches!(err, GridtypesError::Parse { line: 1, .. }), "{}: {:?}", text, err);
        }
        assert_eq!(parse_unit("m^2147483647").unwrap().to_string(), "m^2147483647");

        let err = parse_declarations("TYPE Big(@UNITVAR u) TAGGED Big(NUMBER {@UNITVAR u^2147483647*@UNITVAR u})")
            .unwrap_err();
        assert!(matches!(err, GridtypesError::Parse { .. }), "{:?}", err);
    }

    #[test]
    fn test_parse_values() {
        let manager = TypeManager::new();
        let formats = DateTimeFormats::new();
        let ty = manager
            .resolve(&parse_type("(NUMBER, TAGGED Optional<DATETIME YEARMONTHDAY>, [BOOLEAN], TEXT)").unwrap())
            .unwrap();

        let value = parse_value(r#"(-2.5, Is("2024-03-01"), [true, false], "a \"b\"")"#, &ty, &formats).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            value,
            CellValue::Tuple(vec![
                CellValue::Number(NumberValue::Decimal(-2.5)),
                CellValue::tagged(1, Some(CellValue::Temporal(TemporalValue::YearMonthDay(date)))),
                CellValue::Array(vec![CellValue::Boolean(true), CellValue::Boolean(false)]),
                CellValue::Text("a \"b\"".to_string()),
            ])
        );

        let none = parse_value(r#"(1, "None", [], "")"#, &ty, &formats).unwrap();
        assert_eq!(
            none,
            CellValue::Tuple(vec![
                CellValue::Number(NumberValue::Integer(1)),
                CellValue::tagged(0, None),
                CellValue::Array(vec![]),
                CellValue::Text(String::new()),
            ])
        );
    }

    #[test]
    fn test_parse_value_mismatches() {
        let formats = DateTimeFormats::new();
        assert!(matches!(
            parse_value("\"x\"", &DataType::number(), &formats),
            Err(GridtypesError::Literal(_))
        ));
        assert!(matches!(
            parse_value("[1]", &DataType::empty_array(), &formats),
            Err(GridtypesError::Literal(_))
        ));
        assert!(matches!(
            parse_value("\"01/02/2003\"", &DataType::date(DateTimeType::YearMonthDay), &formats),
            Err(GridtypesError::Literal(message)) if message.contains("Ambiguous")
        ));
    }
}
