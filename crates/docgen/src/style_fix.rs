//! Mechanical first-line fixes applied to every generated body.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Third-person verb forms models like to open with, and their imperative.
static IMPERATIVE_FIXES: &[(&str, &str)] = &[
    ("Raises", "Raise"),
    ("Returns", "Return"),
    ("Yields", "Yield"),
    ("Calculates", "Calculate"),
    ("Computes", "Compute"),
    ("Creates", "Create"),
    ("Generates", "Generate"),
    ("Gets", "Get"),
    ("Sets", "Set"),
    ("Checks", "Check"),
    ("Validates", "Validate"),
    ("Parses", "Parse"),
    ("Processes", "Process"),
    ("Handles", "Handle"),
    ("Executes", "Execute"),
    ("Performs", "Perform"),
    ("Builds", "Build"),
    ("Initializes", "Initialize"),
    ("Converts", "Convert"),
    ("Extracts", "Extract"),
    ("Loads", "Load"),
    ("Saves", "Save"),
    ("Writes", "Write"),
    ("Reads", "Read"),
    ("Sends", "Send"),
    ("Receives", "Receive"),
    ("Updates", "Update"),
    ("Deletes", "Delete"),
    ("Removes", "Remove"),
    ("Adds", "Add"),
    ("Inserts", "Insert"),
    ("Finds", "Find"),
    ("Searches", "Search"),
    ("Sorts", "Sort"),
    ("Filters", "Filter"),
    ("Maps", "Map"),
    ("Reduces", "Reduce"),
    ("Transforms", "Transform"),
    ("Applies", "Apply"),
    ("Runs", "Run"),
    ("Starts", "Start"),
    ("Stops", "Stop"),
    ("Opens", "Open"),
    ("Closes", "Close"),
    ("Connects", "Connect"),
    ("Disconnects", "Disconnect"),
    ("Formats", "Format"),
    ("Prints", "Print"),
    ("Logs", "Log"),
    ("Tests", "Test"),
    ("Verifies", "Verify"),
    ("Determines", "Determine"),
    ("Evaluates", "Evaluate"),
    ("Fetches", "Fetch"),
    ("Retrieves", "Retrieve"),
    ("Stores", "Store"),
    ("Caches", "Cache"),
    ("Clears", "Clear"),
    ("Resets", "Reset"),
    ("Copies", "Copy"),
    ("Moves", "Move"),
    ("Merges", "Merge"),
    ("Splits", "Split"),
    ("Joins", "Join"),
    ("Concatenates", "Concatenate"),
    ("Appends", "Append"),
    ("Prepends", "Prepend"),
    ("Wraps", "Wrap"),
    ("Unwraps", "Unwrap"),
    ("Encodes", "Encode"),
    ("Decodes", "Decode"),
    ("Encrypts", "Encrypt"),
    ("Decrypts", "Decrypt"),
    ("Compresses", "Compress"),
    ("Decompresses", "Decompress"),
    ("Serializes", "Serialize"),
    ("Deserializes", "Deserialize"),
    ("Normalizes", "Normalize"),
    ("Sanitizes", "Sanitize"),
    ("Escapes", "Escape"),
    ("Unescapes", "Unescape"),
    ("Trims", "Trim"),
    ("Strips", "Strip"),
    ("Pads", "Pad"),
    ("Aligns", "Align"),
    ("Centers", "Center"),
    ("Justifies", "Justify"),
    ("Truncates", "Truncate"),
    ("Expands", "Expand"),
    ("Collapses", "Collapse"),
    ("Flattens", "Flatten"),
    ("Groups", "Group"),
    ("Partitions", "Partition"),
    ("Chunks", "Chunk"),
    ("Batches", "Batch"),
    ("Queues", "Queue"),
    ("Dequeues", "Dequeue"),
    ("Pushes", "Push"),
    ("Pops", "Pop"),
    ("Peeks", "Peek"),
    ("Polls", "Poll"),
    ("Waits", "Wait"),
    ("Sleeps", "Sleep"),
    ("Delays", "Delay"),
    ("Schedules", "Schedule"),
    ("Dispatches", "Dispatch"),
    ("Invokes", "Invoke"),
    ("Calls", "Call"),
    ("Triggers", "Trigger"),
    ("Emits", "Emit"),
    ("Publishes", "Publish"),
    ("Subscribes", "Subscribe"),
    ("Unsubscribes", "Unsubscribe"),
    ("Listens", "Listen"),
    ("Broadcasts", "Broadcast"),
    ("Notifies", "Notify"),
    ("Alerts", "Alert"),
    ("Warns", "Warn"),
    ("Configures", "Configure"),
    ("Registers", "Register"),
    ("Unregisters", "Unregister"),
    ("Binds", "Bind"),
    ("Unbinds", "Unbind"),
    ("Attaches", "Attach"),
    ("Detaches", "Detach"),
    ("Mounts", "Mount"),
    ("Unmounts", "Unmount"),
    ("Enables", "Enable"),
    ("Disables", "Disable"),
    ("Activates", "Activate"),
    ("Deactivates", "Deactivate"),
    ("Locks", "Lock"),
    ("Unlocks", "Unlock"),
    ("Acquires", "Acquire"),
    ("Releases", "Release"),
    ("Allocates", "Allocate"),
    ("Deallocates", "Deallocate"),
    ("Frees", "Free"),
    ("Disposes", "Dispose"),
    ("Destroys", "Destroy"),
    ("Terminates", "Terminate"),
    ("Aborts", "Abort"),
    ("Cancels", "Cancel"),
    ("Interrupts", "Interrupt"),
    ("Resumes", "Resume"),
    ("Pauses", "Pause"),
    ("Suspends", "Suspend"),
    ("Restarts", "Restart"),
    ("Reboots", "Reboot"),
    ("Refreshes", "Refresh"),
    ("Reloads", "Reload"),
    ("Syncs", "Sync"),
    ("Synchronizes", "Synchronize"),
    ("Imports", "Import"),
    ("Exports", "Export"),
    ("Downloads", "Download"),
    ("Uploads", "Upload"),
    ("Installs", "Install"),
    ("Uninstalls", "Uninstall"),
    ("Deploys", "Deploy"),
    ("Undeploys", "Undeploy"),
    ("Migrates", "Migrate"),
    ("Upgrades", "Upgrade"),
    ("Downgrades", "Downgrade"),
    ("Patches", "Patch"),
    ("Fixes", "Fix"),
    ("Repairs", "Repair"),
    ("Recovers", "Recover"),
    ("Restores", "Restore"),
    ("Backs", "Back"),
    ("Doubles", "Double"),
];

static IMPERATIVE_LOOKUP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| IMPERATIVE_FIXES.iter().copied().collect());

/// Filler that tends to follow a leading "This".
const THIS_FILLERS: [&str; 7] = [
    "function ",
    "method ",
    "class ",
    "module ",
    "is a ",
    "is an ",
    "will ",
];

const TERMINAL_PUNCTUATION: [char; 4] = ['.', '!', '?', ':'];

/// Imperative form of `word`, if it is a known third-person verb.
pub fn imperative_form(word: &str) -> Option<&'static str> {
    IMPERATIVE_LOOKUP.get(word).copied()
}

/// Replace a known third-person first word with its imperative form.
///
/// Only an exact match of the first space-delimited word is replaced.
pub fn fix_imperative_mood(content: &str) -> String {
    let (first_line, rest) = split_first_line(content);

    let fixed = match first_line.split_once(' ') {
        Some((word, tail)) => imperative_form(word).map(|verb| format!("{verb} {tail}")),
        None => imperative_form(first_line).map(str::to_string),
    };

    match fixed {
        Some(line) => join_first_line(&line, rest),
        None => content.to_string(),
    }
}

/// Drop a leading "This", capitalize, and terminate the first line.
pub fn fix_first_line(content: &str) -> String {
    let (first_line, rest) = split_first_line(content);
    let mut line = first_line.trim().to_string();

    if line.is_empty() {
        return content.to_string();
    }

    if starts_with_ignore_case(&line, "this ") {
        let remainder = line[5..].trim();
        if !remainder.is_empty() {
            let remainder = THIS_FILLERS
                .iter()
                .find(|filler| starts_with_ignore_case(remainder, filler))
                .map(|filler| &remainder[filler.len()..])
                .unwrap_or(remainder);
            line = remainder.trim_start().to_string();
        }
    }

    line = capitalize_first(&line);

    if let Some(last) = line.chars().last() {
        if !TERMINAL_PUNCTUATION.contains(&last) {
            line.push('.');
        }
    }

    join_first_line(&line, rest)
}

/// Full first-line pass: imperative mood, then the mechanical fixes.
///
/// Removing a leading "This ..." exposes a new first word, so the imperative
/// fix runs once more at the end.
pub fn apply_style_fixes(content: &str) -> String {
    let content = fix_imperative_mood(content);
    let content = fix_first_line(&content);
    fix_imperative_mood(&content)
}

/// False when the first line is empty or still opens with a bare "This",
/// which happens when the model wrote nothing after it.
pub fn summary_is_usable(content: &str) -> bool {
    let (first_line, _) = split_first_line(content);
    match first_line.split_whitespace().next() {
        Some(word) => !word
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .eq_ignore_ascii_case("this"),
        None => false,
    }
}

fn split_first_line(content: &str) -> (&str, Option<&str>) {
    match content.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (content, None),
    }
}

fn join_first_line(first: &str, rest: Option<&str>) -> String {
    match rest {
        Some(rest) => format!("{first}\n{rest}"),
        None => first.to_string(),
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

fn capitalize_first(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => line.to_string(),
    }
}
