// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Address specification, [RFC 5322 section 3.4](
//! https://datatracker.ietf.org/doc/html/rfc5322#section-3.4)

use serde::Serialize;
use std::{fmt, slice};

use crate::syntax::*;
use super::{
    syntax::{atom, cfws, domain_literal, list_of, phrase, word, Phrase},
    token::{self, render, Retention, Token},
};

// ------------------------------------------------------------ 3.4. Address ---

/// Value of an address field: `From`, `To`, `Cc`, and so on
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressList(pub Vec<AddressOrGroup>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AddressOrGroup {
    Mailbox(Mailbox),
    Group(Group),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: Address,
    /// Obsolete source route, such as `@machine.tld`, removed from the address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// All comments which appeared in this mailbox, with their parentheses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<Mailbox>,
}

impl AddressList {
    pub fn entries(&self) -> &[AddressOrGroup] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All mailboxes in this list, with group members in place of groups
    pub fn mailboxes(&self) -> impl Iterator<Item = &Mailbox> {
        self.0.iter().flat_map(|entry| match entry {
            AddressOrGroup::Mailbox(mailbox) => slice::from_ref(mailbox),
            AddressOrGroup::Group(group) => group.members.as_slice(),
        })
    }

    /// Addr-specs of all mailboxes
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.mailboxes().map(|mailbox| mailbox.address.as_str())
    }

    /// All mailboxes written as `Name <address>` or just `address`
    pub fn formatted(&self) -> Vec<String> {
        self.mailboxes().map(Mailbox::formatted).collect()
    }

    pub fn display_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.mailboxes().map(|mailbox| mailbox.name.as_deref())
    }

    /// Names of all groups, including empty ones
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|entry| match entry {
            AddressOrGroup::Group(group) => Some(group.name.as_str()),
            AddressOrGroup::Mailbox(_) => None,
        })
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, entry) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match entry {
                AddressOrGroup::Mailbox(mailbox) => write!(f, "{mailbox}")?,
                AddressOrGroup::Group(group) => write!(f, "{group}")?,
            }
        }
        Ok(())
    }
}

impl<'a> Parse<'a> for AddressOrGroup {
    fn parse(from: &mut Buffer<'a>) -> Result<Self> {
        address(from)
    }
}

pub fn address_list(buf: &mut Buffer) -> Result<AddressList> {
    // address-list = (address *("," address)) / obs-addr-list
    let list = list_of::<AddressOrGroup>(buf);
    buf.maybe(cfws);
    Ok(AddressList(list))
}

pub fn address(buf: &mut Buffer) -> Result<AddressOrGroup> {
    // address = mailbox / group
    mailbox(buf).map(AddressOrGroup::Mailbox)
        .or_else(|_| group(buf).map(AddressOrGroup::Group))
}

impl Mailbox {
    /// This mailbox as it would be written in a field: the display name is
    /// quoted when it could not be read back otherwise
    pub fn formatted(&self) -> String {
        match self.name {
            Some(ref name) => format!("{} <{}>", token::phrase(name, false), self.address),
            None => self.address.to_string(),
        }
    }
}

impl From<Address> for Mailbox {
    fn from(address: Address) -> Self {
        Mailbox {
            name: None,
            address,
            route: None,
            comments: Vec::new(),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl<'a> Parse<'a> for Mailbox {
    fn parse(from: &mut Buffer<'a>) -> Result<Self> {
        mailbox(from)
    }
}

pub fn mailbox(buf: &mut Buffer) -> Result<Mailbox> {
    // mailbox = name-addr / addr-spec
    let (text, mut mailbox) = buf.consumed(|buf| {
        name_addr(buf).or_else(|_| addr_spec(buf).map(Mailbox::from))
    })?;

    mailbox.comments = token::tokens(text)
        .filter_map(|(_, token)| match token {
            Token::Comment(comment) => Some(comment.to_string()),
            _ => None,
        })
        .collect();

    Ok(mailbox)
}

pub fn name_addr(buf: &mut Buffer) -> Result<Mailbox> {
    // name-addr = [display-name] angle-addr
    buf.atomic(|buf| {
        let name = buf.maybe(display_name)
            .map(|name| name.text())
            .filter(|name| !name.is_empty());
        let (route, address) = angle_addr(buf)?;

        Ok(Mailbox {
            name,
            address,
            route,
            comments: Vec::new(),
        })
    })
}

pub fn angle_addr(buf: &mut Buffer) -> Result<(Option<String>, Address)> {
    // angle-addr     = [CFWS] "<" addr-spec ">" [CFWS] / obs-angle-addr
    // obs-angle-addr = [CFWS] "<" obs-route addr-spec ">" [CFWS]
    buf.atomic(|buf| {
        buf.maybe(cfws);
        buf.expect("<")?;
        let route = buf.maybe(obs_route);
        let address = addr_spec(buf)?;
        buf.expect(">")?;
        buf.maybe(cfws);
        Ok((route, address))
    })
}

/// Obsolete source route, returned without its trailing colon
pub fn obs_route(buf: &mut Buffer) -> Result<String> {
    // obs-route       = obs-domain-list ":"
    // obs-domain-list = *(CFWS / ",") "@" domain
    //                   *("," [CFWS] ["@" domain])
    let text = buf.take_matching(|buf| {
        while buf.maybe(cfws).is_some() || buf.expect(",").is_ok() {}

        buf.expect("@")?;
        domain(buf)?;

        while buf.expect(",").is_ok() {
            buf.maybe(cfws);
            buf.maybe(|buf| {
                buf.expect("@")?;
                domain(buf)
            });
        }

        Ok(())
    })?;
    buf.expect(":")?;

    log::trace!("dropping obsolete route {:?}", text);

    Ok(render(text, Retention::Discard))
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", token::phrase(&self.name, true))?;
        for (index, member) in self.members.iter().enumerate() {
            f.write_str(if index == 0 { " " } else { ", " })?;
            write!(f, "{member}")?;
        }
        f.write_str(";")
    }
}

pub fn group(buf: &mut Buffer) -> Result<Group> {
    // group          = display-name ":" [group-list] ";" [CFWS]
    // group-list     = mailbox-list / CFWS / obs-group-list
    // obs-group-list = 1*([CFWS] ",") [CFWS]
    buf.atomic(|buf| {
        let name = display_name(buf)?;
        buf.expect(":")?;
        let members = list_of::<Mailbox>(buf);
        buf.maybe(cfws);

        if buf.expect(";").is_err() {
            if buf.is_empty() {
                log::trace!("group {:?} not terminated", name.0);
            } else {
                return buf.error(SyntaxError::Expected(";"));
            }
        }

        buf.maybe(cfws);

        Ok(Group {
            name: name.with_comments(),
            members,
        })
    })
}

pub fn display_name<'a>(buf: &mut Buffer<'a>) -> Result<Phrase<'a>> {
    // display-name = phrase
    phrase(buf)
}

// -------------------------------------------------------- 3.4.1. Addr-Spec ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Address {
    /// The addr-spec with comments between its first and last token
    pub spec: String,
    /// Local part without comments, quoted strings left quoted
    pub local: String,
    /// Domain without comments
    pub domain: String,
}

impl Address {
    pub fn as_str(&self) -> &str {
        &self.spec
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

pub fn addr_spec(buf: &mut Buffer) -> Result<Address> {
    // addr-spec = local-part "@" domain
    let (text, (local, domain)) = buf.consumed(|buf| {
        let local = local_part(buf)?;
        buf.expect("@")?;
        let domain = domain(buf)?;
        Ok((local, domain))
    })?;

    Ok(Address {
        spec: render(text, Retention::AddrSpec),
        local: render(local, Retention::Discard),
        domain: render(domain, Retention::Discard),
    })
}

pub fn local_part<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // local-part     = dot-atom / quoted-string / obs-local-part
    // obs-local-part = word *("." word)
    buf.take_matching(|buf| {
        word(buf)?;

        while buf.expect(".").is_ok() {
            if buf.maybe(word).is_none() {
                log::trace!("empty word in local part at {}", buf.location());
            }
        }

        Ok(())
    })
}

pub fn domain<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // domain     = dot-atom / domain-literal / obs-domain
    // obs-domain = atom *("." atom)
    buf.take_matching(|buf| {
        if domain_literal(buf).is_ok() {
            return Ok(());
        }

        atom(buf)?;

        while buf.atomic(|buf| {
            buf.expect(".")?;
            atom(buf)
        }).is_ok() {}

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AddressList {
        let mut buf = Buffer::new(text);
        let list = address_list(&mut buf).unwrap();
        buf.expect_empty().unwrap();
        list
    }

    #[test]
    fn simple_mailboxes() {
        let list = parse("Mary Smith <mary@x.test>, jdoe@example.org, Who? <one@y.test>");
        assert_eq!(list.formatted(),
            ["Mary Smith <mary@x.test>", "jdoe@example.org", "Who? <one@y.test>"]);
        assert_eq!(list.display_names().collect::<Vec<_>>(),
            [Some("Mary Smith"), None, Some("Who?")]);
    }

    #[test]
    fn quoted_display_names() {
        let list = parse(r#"<boss@nil.test>, "Giant; \"Big\" Box" <sysservices@example.net>"#);
        assert_eq!(list.formatted(),
            ["boss@nil.test", r#""Giant; \"Big\" Box" <sysservices@example.net>"#]);

        let list = parse(r#""Mary Smith: Personal Account" <smith@home.example>"#);
        assert_eq!(list.addresses().collect::<Vec<_>>(), ["smith@home.example"]);
        assert_eq!(list.formatted(), [r#""Mary Smith: Personal Account" <smith@home.example>"#]);
    }

    #[test]
    fn comments_in_addresses() {
        let list = parse("Pete(A wonderful \\) chap) <pete(his account)@silly.test(his host)>");
        let mailbox = list.mailboxes().next().unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Pete"));
        assert_eq!(mailbox.address.spec, "pete(his account)@silly.test");
        assert_eq!(mailbox.address.local, "pete");
        assert_eq!(mailbox.address.domain, "silly.test");
        assert_eq!(mailbox.comments,
            ["(A wonderful \\) chap)", "(his account)", "(his host)"]);
    }

    #[test]
    fn group_with_members() {
        let list = parse("A Group(Some people)\r\n     :Chris Jones <c@(Chris's host.)public.example>,\r\n         joe@example.org,\r\n  John <jdoe@one.test> (my dear friend); (the end of the group)");
        assert_eq!(list.addresses().collect::<Vec<_>>(),
            ["c@(Chris's host.)public.example", "joe@example.org", "jdoe@one.test"]);
        assert_eq!(list.group_names().collect::<Vec<_>>(), ["A Group(Some people) "]);
    }

    #[test]
    fn empty_groups() {
        let list = parse("Undisclosed recipients:;");
        assert_eq!(list.group_names().collect::<Vec<_>>(), ["Undisclosed recipients"]);
        assert_eq!(list.addresses().count(), 0);

        let list = parse("(Empty list)(start)Undisclosed recipients  :(nobody(that I know))  ;");
        assert_eq!(list.group_names().collect::<Vec<_>>(),
            ["(Empty list)(start)Undisclosed recipients "]);
        assert_eq!(list.to_string(), "(Empty list)(start)Undisclosed recipients :;");
    }

    #[test]
    fn obsolete_addressing() {
        let list = parse("Mary Smith <@machine.tld:mary@example.net>, , jdoe@test   . example");
        assert_eq!(list.addresses().collect::<Vec<_>>(), ["mary@example.net", "jdoe@test.example"]);
        let mailbox = list.mailboxes().next().unwrap();
        assert_eq!(mailbox.route.as_deref(), Some("@machine.tld"));

        let list = parse("Joe Q. Public <john.q.public@example.com>");
        assert_eq!(list.formatted(), [r#""Joe Q. Public" <john.q.public@example.com>"#]);
    }

    #[test]
    fn empty_list() {
        let list = parse("");
        assert!(list.is_empty());
        let list = parse("  ");
        assert!(list.is_empty());
    }

    #[test]
    fn malformed_list_stops_early() {
        let mut buf = Buffer::new("mary@example.net <junk");
        address_list(&mut buf).unwrap();
        assert!(buf.expect_empty().is_err());
    }

    #[test]
    fn display_round_trip() {
        let text = "A Group:Chris Jones <c@a.test>,joe@where.test,\"Joe Q. Public\" <jdoe@one.test>;, x@y.test";
        let list = parse(text);
        let written = list.to_string();
        assert_eq!(written,
            "A Group: Chris Jones <c@a.test>, joe@where.test, \"Joe Q. Public\" <jdoe@one.test>;, x@y.test");
        assert_eq!(parse(&written), list);
    }
}
