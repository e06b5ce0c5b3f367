//! Every user-facing text, in the clinic's voice. Handlers and the engine
//! never inline Spanish strings; they come from here.

use appointment_cell::models::Slot;
use sobreturno_cell::{SobreturnoSlot, MORNING_NUMBERS};

pub fn welcome() -> String {
    "🤖🩺 *¡Bienvenido al Asistente Virtual del Dr.Kulinka!* 🩺".to_string()
}

pub fn sobreturno_intro() -> String {
    "🏥 *SOLICITUD DE SOBRETURNO*\n\n\
     Has solicitado un *sobreturno*. Para continuar, necesito algunos datos."
        .to_string()
}

pub fn name_prompt() -> String {
    "Por favor, indícame tu *NOMBRE* y *APELLIDO* (ej: Juan Pérez):".to_string()
}

pub fn name_too_short() -> String {
    "❌ El nombre es demasiado corto. Por favor, ingresa tu nombre completo.".to_string()
}

pub fn name_invalid_characters() -> String {
    "❌ El nombre solo debe contener letras (sin números ni caracteres especiales).".to_string()
}

pub fn name_needs_two_words() -> String {
    "❌ Por favor, ingresa tanto tu nombre como tu apellido separados por un espacio.".to_string()
}

pub fn name_parts_too_short() -> String {
    "❌ Cada parte del nombre debe tener al menos 2 letras.".to_string()
}

pub fn name_still_invalid() -> String {
    "❌ El nombre anterior no es válido. Por favor, ingresa tu nombre completo:".to_string()
}

pub fn thanks_name(first_name: &str) -> String {
    format!("✅ Gracias, {}!", first_name)
}

pub fn plan_menu() -> String {
    "*Perfecto!* Ahora selecciona tu *OBRA SOCIAL* de la siguiente lista:\n\n\
     1️⃣ INSSSEP\n\
     2️⃣ Swiss Medical\n\
     3️⃣ OSDE\n\
     4️⃣ Galeno\n\
     5️⃣ CONSULTA PARTICULAR\n\
     6️⃣ Otras Obras Sociales\n\n\
     _Responde con el número correspondiente (1-6):_"
        .to_string()
}

pub fn plan_invalid() -> String {
    "❌ Opción inválida. Por favor, selecciona un número del 1 al 6.".to_string()
}

/// Numbered flat list of regular slots, morning block first. Positions in
/// the rendered list are what the user answers with.
pub fn slot_list(date_spanish: &str, morning: &[Slot], afternoon: &[Slot]) -> String {
    let mut message = format!(
        "📅 *Horarios disponibles*\n📆 Para el día: *{}*\n\n",
        date_spanish
    );

    let mut position = 0;
    if !morning.is_empty() {
        message.push_str("*🌅 Horarios de mañana:*\n");
        for slot in morning {
            position += 1;
            message.push_str(&format!("{}. ⏰ {}\n", position, slot.display_time));
        }
        message.push('\n');
    }
    if !afternoon.is_empty() {
        message.push_str("*🌇 Horarios de tarde:*\n");
        for slot in afternoon {
            position += 1;
            message.push_str(&format!("{}. ⏰ {}\n", position, slot.display_time));
        }
    }

    message.push_str("\n📝 *Para reservar, responde con el número del horario que deseas*");
    message.push_str("\n🏥 Si necesitas un sobreturno, escribe *\"sobreturnos\"*");
    message.push_str("\n❌ Para cancelar, escribe *\"cancelar\"*");
    message
}

pub fn no_slots() -> String {
    "❌ Lo siento, no hay horarios disponibles para el día solicitado.\n\n\
     🏥 Si necesitas atención urgente, escribe *\"sobreturnos\"* para solicitar un sobreturno."
        .to_string()
}

/// The sobreturno availability view, split by block, listing the fixed
/// numbers the user answers with.
pub fn sobreturno_list(date_spanish: &str, available: &[SobreturnoSlot]) -> String {
    let mut message = format!(
        "📅 *SOBRETURNOS DISPONIBLES*\n📆 *Fecha:* {}\n\n",
        date_spanish
    );

    let morning: Vec<&SobreturnoSlot> = available
        .iter()
        .filter(|s| MORNING_NUMBERS.contains(&s.number))
        .collect();
    let afternoon: Vec<&SobreturnoSlot> = available
        .iter()
        .filter(|s| !MORNING_NUMBERS.contains(&s.number))
        .collect();

    if !morning.is_empty() {
        message.push_str("🌅 *Sobreturnos de mañana:*\n");
        for slot in &morning {
            message.push_str(&format!("{}- Sobreturno {} hs\n", slot.number, slot.time));
        }
        message.push('\n');
    }
    if !afternoon.is_empty() {
        message.push_str("🌇 *Sobreturnos de tarde:*\n");
        for slot in &afternoon {
            message.push_str(&format!("{}- Sobreturno {} hs\n", slot.number, slot.time));
        }
    }

    message.push_str("\n📝 Para seleccionar un sobreturno, responde con el número correspondiente");
    message.push_str("\n❌ Para cancelar, escribe *cancelar*");
    message
}

pub fn no_sobreturnos() -> String {
    "❌ Lo siento, no hay sobreturnos disponibles.\n\n\
     Puedes:\n\
     1️⃣ Intentar más tarde\n\
     2️⃣ Solicitar un turno normal escribiendo \"turnos\"\n\
     3️⃣ Cancelar escribiendo *cancelar*"
        .to_string()
}

pub fn slot_selection_invalid() -> String {
    "Número de horario inválido. Por favor, intenta nuevamente.".to_string()
}

pub fn sobreturno_selection_invalid() -> String {
    "❌ Por favor, responde con un número válido (1-10) o escribe *cancelar* para cancelar."
        .to_string()
}

pub fn appointment_confirmation(
    date_spanish: &str,
    time: &str,
    client_name: &str,
    phone: &str,
    social_work: &str,
) -> String {
    format!(
        "✨ *CONFIRMACIÓN DE CITA MÉDICA* ✨\n\n\
         ✅ La cita ha sido agendada exitosamente\n\n\
         📅 *Fecha:* {date_spanish}\n\
         🕒 *Hora:* {time}\n\
         👤 *Paciente:* {client_name}\n\
         📞 *Teléfono:* {phone}\n\
         🏥 *Obra Social:* {social_work}\n\n\
         ℹ️ *Información importante:*\n\
         - Por favor, llegue 10 minutos antes de su cita\n\
         - Traiga su documento de identidad\n\
         - Traiga su carnet de obra social\n\n\
         *¡Gracias por confiar en nosotros!* 🙏"
    )
}

pub fn sobreturno_confirmation(
    date_spanish: &str,
    number: u8,
    client_name: &str,
    phone: &str,
    social_work: &str,
) -> String {
    format!(
        "✨ *CONFIRMACIÓN DE SOBRETURNO* ✨\n\n\
         ✅ *¡Tu sobreturno ha sido agendado exitosamente!*\n\n\
         📅 *Fecha:* {date_spanish}\n\
         🔢 *Sobreturno:* {number}\n\
         👤 *Paciente:* {client_name}\n\
         📞 *Teléfono:* {phone}\n\
         🏥 *Obra Social:* {social_work}\n\n\
         ⚠️ *IMPORTANTE:*\n\
         • Llegue 10 minutos antes\n\
         • Traiga documento de identidad\n\
         • Traiga carnet de obra social\n\
         • *El sobreturno depende de la disponibilidad del médico*\n\n\
         *¡Gracias por confiar en nosotros!* 🙏"
    )
}

pub fn sobreturno_taken() -> String {
    "❌ Lo siento, este sobreturno ya no está disponible. Por favor, elige otro número."
        .to_string()
}

pub fn offline_error() -> String {
    "❌ No pude conectarme al sistema. Por favor, intenta nuevamente más tarde.".to_string()
}

pub fn booking_failed(reason: &str) -> String {
    format!(
        "❌ {} Por favor, intenta nuevamente más tarde.",
        if reason.is_empty() {
            "Hubo un problema al crear la cita."
        } else {
            reason
        }
    )
}

pub fn missing_data_restart(flow_keyword: &str) -> String {
    format!(
        "❌ Faltan datos para procesar tu solicitud. Por favor, inicia nuevamente escribiendo \"{}\".",
        flow_keyword
    )
}

pub fn cancelled() -> String {
    "❌ *Reserva cancelada.* Si necesitas más ayuda, no dudes en contactarnos nuevamente.\n\
     🤗 ¡Que tengas un excelente día!"
        .to_string()
}

pub fn farewell() -> String {
    "👋 *¡Hasta luego! Si necesitas más ayuda, no dudes en contactarnos nuevamente.*".to_string()
}

pub fn unknown_entry() -> String {
    "🤖 Hola! Escribe *\"turnos\"* para reservar una cita o *\"sobreturnos\"* para solicitar un sobreturno."
        .to_string()
}

pub fn admin_help() -> String {
    "Comandos disponibles:\n!status - Muestra el estado actual del bot".to_string()
}

pub fn admin_status(backend_online: bool) -> String {
    format!(
        "Estado del bot: conectado\nBackend: {}",
        if backend_online {
            "en línea"
        } else {
            "sin conexión"
        }
    )
}
