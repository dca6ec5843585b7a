//! Typed replies and their wire encoding.
//!
//! A reply is 32 bytes plus `reply-length * 4` extra bytes; byte 0 is 1,
//! bytes 2–3 echo the request's sequence number. Handlers construct
//! [`Reply`] values and the dispatcher encodes them, so sequence-number
//! discipline stays in one place.

use bytes::Bytes;

use super::types::*;
use super::wire::{padded, WireWriter};
use super::xinput::XIReply;

/// Glyph extents as served by QueryFont / ListFontsWithInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharInfo {
    pub left_side_bearing: i16,
    pub right_side_bearing: i16,
    pub character_width: i16,
    pub ascent: i16,
    pub descent: i16,
    pub attributes: u16,
}

impl CharInfo {
    fn encode(&self, w: &mut WireWriter) {
        w.write_i16(self.left_side_bearing);
        w.write_i16(self.right_side_bearing);
        w.write_i16(self.character_width);
        w.write_i16(self.ascent);
        w.write_i16(self.descent);
        w.write_u16(self.attributes);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontProp {
    pub name: Atom,
    pub value: u32,
}

/// The metric block shared by QueryFont and ListFontsWithInfo replies.
#[derive(Debug, Clone, Default)]
pub struct FontInfo {
    pub min_bounds: CharInfo,
    pub max_bounds: CharInfo,
    pub min_char_or_byte2: u16,
    pub max_char_or_byte2: u16,
    pub default_char: u16,
    pub draw_direction: u8,
    pub min_byte1: u8,
    pub max_byte1: u8,
    pub all_chars_exist: bool,
    pub font_ascent: i16,
    pub font_descent: i16,
    pub properties: Vec<FontProp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionHistoryEntry {
    pub time: Timestamp,
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb16 {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// One entry of a ListHosts reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub family: u8,
    pub address: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Reply {
    GetWindowAttributes {
        backing_store: u8,
        visual: VisualId,
        class: WindowClass,
        bit_gravity: u8,
        win_gravity: u8,
        backing_planes: u32,
        backing_pixel: u32,
        save_under: bool,
        map_is_installed: bool,
        map_state: MapState,
        override_redirect: bool,
        colormap: ColormapId,
        all_event_masks: EventMask,
        your_event_mask: EventMask,
        do_not_propagate_mask: EventMask,
    },
    GetGeometry {
        depth: u8,
        root: WindowId,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        border_width: u16,
    },
    QueryTree { root: WindowId, parent: WindowId, children: Vec<WindowId> },
    InternAtom { atom: Atom },
    GetAtomName { name: String },
    GetProperty {
        format: u8,
        property_type: Atom,
        bytes_after: u32,
        value: Vec<u8>,
    },
    ListProperties { atoms: Vec<Atom> },
    GetSelectionOwner { owner: WindowId },
    GrabStatus { status: GrabStatus },
    QueryPointer {
        same_screen: bool,
        root: WindowId,
        child: WindowId,
        root_x: i16,
        root_y: i16,
        win_x: i16,
        win_y: i16,
        mask: KeyButMask,
    },
    GetMotionEvents { events: Vec<MotionHistoryEntry> },
    TranslateCoordinates { same_screen: bool, child: WindowId, dst_x: i16, dst_y: i16 },
    GetInputFocus { revert_to: RevertTo, focus: WindowId },
    QueryKeymap { keys: [u8; 32] },
    QueryFont { info: FontInfo, char_infos: Vec<CharInfo> },
    QueryTextExtents {
        draw_direction: u8,
        font_ascent: i16,
        font_descent: i16,
        overall_ascent: i16,
        overall_descent: i16,
        overall_width: i32,
        overall_left: i32,
        overall_right: i32,
    },
    ListFonts { names: Vec<String> },
    /// One reply of the ListFontsWithInfo stream; the handler emits the
    /// zero-length terminator as the final instance.
    ListFontsWithInfo { name: String, info: FontInfo, replies_hint: u32 },
    GetFontPath { paths: Vec<String> },
    AllocColor { color: Rgb16, pixel: u32 },
    AllocNamedColor { pixel: u32, exact: Rgb16, visual: Rgb16 },
    AllocColorCells { pixels: Vec<u32>, masks: Vec<u32> },
    AllocColorPlanes {
        pixels: Vec<u32>,
        red_mask: u32,
        green_mask: u32,
        blue_mask: u32,
    },
    QueryColors { colors: Vec<Rgb16> },
    LookupColor { exact: Rgb16, visual: Rgb16 },
    ListInstalledColormaps { colormaps: Vec<ColormapId> },
    GetImage { depth: u8, visual: VisualId, data: Vec<u8> },
    QueryBestSize { width: u16, height: u16 },
    QueryExtension { present: bool, major_opcode: u8, first_event: u8, first_error: u8 },
    ListExtensions { names: Vec<String> },
    GetKeyboardMapping { keysyms_per_keycode: u8, keysyms: Vec<KeySym> },
    GetKeyboardControl {
        global_auto_repeat: bool,
        led_mask: u32,
        key_click_percent: u8,
        bell_percent: u8,
        bell_pitch: u16,
        bell_duration: u16,
        auto_repeats: [u8; 32],
    },
    GetPointerControl { acceleration_numerator: u16, acceleration_denominator: u16, threshold: u16 },
    GetScreenSaver { timeout: u16, interval: u16, prefer_blanking: u8, allow_exposures: u8 },
    ListHosts { enabled: bool, hosts: Vec<HostEntry> },
    SetPointerMapping { status: u8 },
    GetPointerMapping { map: Vec<u8> },
    SetModifierMapping { status: u8 },
    GetModifierMapping { keycodes_per_modifier: u8, keycodes: Vec<KeyCode> },
    /// A reply from the XInput dispatcher.
    XInput(XIReply),
}

/// Assemble the standard reply frame: `build` writes everything after the
/// 8-byte header; short bodies are padded to the fixed 24 bytes and long
/// ones to a 4-byte boundary.
fn frame(
    order: ByteOrder,
    sequence: SequenceNumber,
    data_byte: u8,
    build: impl FnOnce(&mut WireWriter),
) -> Bytes {
    let mut body = WireWriter::new(order);
    build(&mut body);
    let body = body.into_bytes();

    let extra = padded(body.len().saturating_sub(24));
    let total = 32 + extra;
    let mut w = WireWriter::with_capacity(order, total);
    w.write_u8(1);
    w.write_u8(data_byte);
    w.write_u16(sequence);
    w.write_u32((extra / 4) as u32);
    w.write_bytes(&body);
    w.write_zeros(total - 8 - body.len());
    w.into_bytes()
}

impl Reply {
    pub fn encode(&self, sequence: SequenceNumber, order: ByteOrder) -> Bytes {
        match self {
            Reply::GetWindowAttributes {
                backing_store,
                visual,
                class,
                bit_gravity,
                win_gravity,
                backing_planes,
                backing_pixel,
                save_under,
                map_is_installed,
                map_state,
                override_redirect,
                colormap,
                all_event_masks,
                your_event_mask,
                do_not_propagate_mask,
            } => frame(order, sequence, *backing_store, |w| {
                w.write_u32(*visual);
                w.write_u16(*class as u16);
                w.write_u8(*bit_gravity);
                w.write_u8(*win_gravity);
                w.write_u32(*backing_planes);
                w.write_u32(*backing_pixel);
                w.write_bool(*save_under);
                w.write_bool(*map_is_installed);
                w.write_u8(*map_state as u8);
                w.write_bool(*override_redirect);
                w.write_u32(*colormap);
                w.write_u32(all_event_masks.bits());
                w.write_u32(your_event_mask.bits());
                w.write_u16(do_not_propagate_mask.bits() as u16);
                w.write_zeros(2);
            }),
            Reply::GetGeometry { depth, root, x, y, width, height, border_width } => {
                frame(order, sequence, *depth, |w| {
                    w.write_u32(*root);
                    w.write_i16(*x);
                    w.write_i16(*y);
                    w.write_u16(*width);
                    w.write_u16(*height);
                    w.write_u16(*border_width);
                })
            }
            Reply::QueryTree { root, parent, children } => frame(order, sequence, 0, |w| {
                w.write_u32(*root);
                w.write_u32(*parent);
                w.write_u16(children.len() as u16);
                w.write_zeros(14);
                for child in children {
                    w.write_u32(*child);
                }
            }),
            Reply::InternAtom { atom } => frame(order, sequence, 0, |w| {
                w.write_u32(*atom);
            }),
            Reply::GetAtomName { name } => frame(order, sequence, 0, |w| {
                w.write_u16(name.len() as u16);
                w.write_zeros(22);
                w.write_string_padded(name);
            }),
            Reply::GetProperty { format, property_type, bytes_after, value } => {
                let unit = if *format == 0 { 1 } else { *format as usize / 8 };
                frame(order, sequence, *format, |w| {
                    w.write_u32(*property_type);
                    w.write_u32(*bytes_after);
                    w.write_u32((value.len() / unit) as u32);
                    w.write_zeros(12);
                    w.write_bytes(value);
                })
            }
            Reply::ListProperties { atoms } => frame(order, sequence, 0, |w| {
                w.write_u16(atoms.len() as u16);
                w.write_zeros(22);
                for atom in atoms {
                    w.write_u32(*atom);
                }
            }),
            Reply::GetSelectionOwner { owner } => frame(order, sequence, 0, |w| {
                w.write_u32(*owner);
            }),
            Reply::GrabStatus { status } => frame(order, sequence, *status as u8, |_| {}),
            Reply::QueryPointer {
                same_screen,
                root,
                child,
                root_x,
                root_y,
                win_x,
                win_y,
                mask,
            } => frame(order, sequence, *same_screen as u8, |w| {
                w.write_u32(*root);
                w.write_u32(*child);
                w.write_i16(*root_x);
                w.write_i16(*root_y);
                w.write_i16(*win_x);
                w.write_i16(*win_y);
                w.write_u16(mask.bits());
            }),
            Reply::GetMotionEvents { events } => frame(order, sequence, 0, |w| {
                w.write_u32(events.len() as u32);
                w.write_zeros(20);
                for entry in events {
                    w.write_u32(entry.time);
                    w.write_i16(entry.x);
                    w.write_i16(entry.y);
                }
            }),
            Reply::TranslateCoordinates { same_screen, child, dst_x, dst_y } => {
                frame(order, sequence, *same_screen as u8, |w| {
                    w.write_u32(*child);
                    w.write_i16(*dst_x);
                    w.write_i16(*dst_y);
                })
            }
            Reply::GetInputFocus { revert_to, focus } => {
                frame(order, sequence, *revert_to as u8, |w| {
                    w.write_u32(*focus);
                })
            }
            Reply::QueryKeymap { keys } => frame(order, sequence, 0, |w| {
                w.write_bytes(keys);
            }),
            Reply::QueryFont { info, char_infos } => frame(order, sequence, 0, |w| {
                write_font_info(w, info);
                w.write_u32(char_infos.len() as u32);
                for ci in char_infos {
                    ci.encode(w);
                }
            }),
            Reply::QueryTextExtents {
                draw_direction,
                font_ascent,
                font_descent,
                overall_ascent,
                overall_descent,
                overall_width,
                overall_left,
                overall_right,
            } => frame(order, sequence, *draw_direction, |w| {
                w.write_i16(*font_ascent);
                w.write_i16(*font_descent);
                w.write_i16(*overall_ascent);
                w.write_i16(*overall_descent);
                w.write_i32(*overall_width);
                w.write_i32(*overall_left);
                w.write_i32(*overall_right);
            }),
            Reply::ListFonts { names } => frame(order, sequence, 0, |w| {
                w.write_u16(names.len() as u16);
                w.write_zeros(22);
                let mut block = 0usize;
                for name in names {
                    w.write_u8(name.len() as u8);
                    block += 1 + name.len();
                    for ch in name.chars() {
                        w.write_u8(ch as u8);
                    }
                }
                w.write_zeros(padded(block) - block);
            }),
            Reply::ListFontsWithInfo { name, info, replies_hint } => {
                frame(order, sequence, name.len() as u8, |w| {
                    write_font_info(w, info);
                    w.write_u32(*replies_hint);
                    w.write_string_padded(name);
                })
            }
            Reply::GetFontPath { paths } => frame(order, sequence, 0, |w| {
                w.write_u16(paths.len() as u16);
                w.write_zeros(22);
                let mut block = 0usize;
                for path in paths {
                    w.write_u8(path.len() as u8);
                    block += 1 + path.len();
                    for ch in path.chars() {
                        w.write_u8(ch as u8);
                    }
                }
                w.write_zeros(padded(block) - block);
            }),
            Reply::AllocColor { color, pixel } => frame(order, sequence, 0, |w| {
                w.write_u16(color.red);
                w.write_u16(color.green);
                w.write_u16(color.blue);
                w.write_zeros(2);
                w.write_u32(*pixel);
            }),
            Reply::AllocNamedColor { pixel, exact, visual } => frame(order, sequence, 0, |w| {
                w.write_u32(*pixel);
                w.write_u16(exact.red);
                w.write_u16(exact.green);
                w.write_u16(exact.blue);
                w.write_u16(visual.red);
                w.write_u16(visual.green);
                w.write_u16(visual.blue);
            }),
            Reply::AllocColorCells { pixels, masks } => frame(order, sequence, 0, |w| {
                w.write_u16(pixels.len() as u16);
                w.write_u16(masks.len() as u16);
                w.write_zeros(20);
                for pixel in pixels {
                    w.write_u32(*pixel);
                }
                for mask in masks {
                    w.write_u32(*mask);
                }
            }),
            Reply::AllocColorPlanes { pixels, red_mask, green_mask, blue_mask } => {
                frame(order, sequence, 0, |w| {
                    w.write_u16(pixels.len() as u16);
                    w.write_zeros(2);
                    w.write_u32(*red_mask);
                    w.write_u32(*green_mask);
                    w.write_u32(*blue_mask);
                    w.write_zeros(8);
                    for pixel in pixels {
                        w.write_u32(*pixel);
                    }
                })
            }
            Reply::QueryColors { colors } => frame(order, sequence, 0, |w| {
                w.write_u16(colors.len() as u16);
                w.write_zeros(22);
                for color in colors {
                    w.write_u16(color.red);
                    w.write_u16(color.green);
                    w.write_u16(color.blue);
                    w.write_zeros(2);
                }
            }),
            Reply::LookupColor { exact, visual } => frame(order, sequence, 0, |w| {
                w.write_u16(exact.red);
                w.write_u16(exact.green);
                w.write_u16(exact.blue);
                w.write_u16(visual.red);
                w.write_u16(visual.green);
                w.write_u16(visual.blue);
            }),
            Reply::ListInstalledColormaps { colormaps } => frame(order, sequence, 0, |w| {
                w.write_u16(colormaps.len() as u16);
                w.write_zeros(22);
                for colormap in colormaps {
                    w.write_u32(*colormap);
                }
            }),
            Reply::GetImage { depth, visual, data } => frame(order, sequence, *depth, |w| {
                w.write_u32(*visual);
                w.write_zeros(20);
                w.write_bytes(data);
            }),
            Reply::QueryBestSize { width, height } => frame(order, sequence, 0, |w| {
                w.write_u16(*width);
                w.write_u16(*height);
            }),
            Reply::QueryExtension { present, major_opcode, first_event, first_error } => {
                frame(order, sequence, 0, |w| {
                    w.write_bool(*present);
                    w.write_u8(*major_opcode);
                    w.write_u8(*first_event);
                    w.write_u8(*first_error);
                })
            }
            Reply::ListExtensions { names } => frame(order, sequence, names.len() as u8, |w| {
                w.write_zeros(24);
                let mut block = 0usize;
                for name in names {
                    w.write_u8(name.len() as u8);
                    block += 1 + name.len();
                    for ch in name.chars() {
                        w.write_u8(ch as u8);
                    }
                }
                w.write_zeros(padded(block) - block);
            }),
            Reply::GetKeyboardMapping { keysyms_per_keycode, keysyms } => {
                frame(order, sequence, *keysyms_per_keycode, |w| {
                    w.write_zeros(24);
                    for keysym in keysyms {
                        w.write_u32(*keysym);
                    }
                })
            }
            Reply::GetKeyboardControl {
                global_auto_repeat,
                led_mask,
                key_click_percent,
                bell_percent,
                bell_pitch,
                bell_duration,
                auto_repeats,
            } => frame(order, sequence, *global_auto_repeat as u8, |w| {
                w.write_u32(*led_mask);
                w.write_u8(*key_click_percent);
                w.write_u8(*bell_percent);
                w.write_u16(*bell_pitch);
                w.write_u16(*bell_duration);
                w.write_zeros(2);
                w.write_bytes(auto_repeats);
            }),
            Reply::GetPointerControl {
                acceleration_numerator,
                acceleration_denominator,
                threshold,
            } => frame(order, sequence, 0, |w| {
                w.write_u16(*acceleration_numerator);
                w.write_u16(*acceleration_denominator);
                w.write_u16(*threshold);
            }),
            Reply::GetScreenSaver { timeout, interval, prefer_blanking, allow_exposures } => {
                frame(order, sequence, 0, |w| {
                    w.write_u16(*timeout);
                    w.write_u16(*interval);
                    w.write_u8(*prefer_blanking);
                    w.write_u8(*allow_exposures);
                })
            }
            Reply::ListHosts { enabled, hosts } => frame(order, sequence, *enabled as u8, |w| {
                w.write_u16(hosts.len() as u16);
                w.write_zeros(22);
                for host in hosts {
                    w.write_u8(host.family);
                    w.write_u8(0);
                    w.write_u16(host.address.len() as u16);
                    w.write_bytes(&host.address);
                    w.write_zeros(padded(host.address.len()) - host.address.len());
                }
            }),
            Reply::SetPointerMapping { status } => frame(order, sequence, *status, |_| {}),
            Reply::GetPointerMapping { map } => frame(order, sequence, map.len() as u8, |w| {
                w.write_zeros(24);
                w.write_bytes(map);
            }),
            Reply::SetModifierMapping { status } => frame(order, sequence, *status, |_| {}),
            Reply::GetModifierMapping { keycodes_per_modifier, keycodes } => {
                frame(order, sequence, *keycodes_per_modifier, |w| {
                    w.write_zeros(24);
                    w.write_bytes(keycodes);
                })
            }
            Reply::XInput(xi) => xi.encode(sequence, order),
        }
    }
}

fn write_font_info(w: &mut WireWriter, info: &FontInfo) {
    info.min_bounds.encode(w);
    w.write_zeros(4);
    info.max_bounds.encode(w);
    w.write_zeros(4);
    w.write_u16(info.min_char_or_byte2);
    w.write_u16(info.max_char_or_byte2);
    w.write_u16(info.default_char);
    w.write_u16(info.properties.len() as u16);
    w.write_u8(info.draw_direction);
    w.write_u8(info.min_byte1);
    w.write_u8(info.max_byte1);
    w.write_bool(info.all_chars_exist);
    w.write_i16(info.font_ascent);
    w.write_i16(info.font_descent);
    for prop in &info.properties {
        w.write_u32(prop.name);
        w.write_u32(prop.value);
    }
}
