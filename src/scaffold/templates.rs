//! Bodies of the companion files of an import project.

use crate::config::{Platform, BINARY_DIR, CONF_DIR, DATA_DIR, LOG_DIR, ORIGIN_DIR};

/// Connection profile of the target instance.
///
/// Remote hosts always get an encrypted connection, local ones keep plain
/// JSON-RPC with the default admin account.
pub fn connection_local(host: &str, database: &str, userid: u32, is_remote: bool) -> String {
    let (protocol, port) = if is_remote { ("jsonrpcs", 443) } else { ("jsonrpc", 8069) };
    format!(
        "[Connection]\nhostname = {}\ndatabase = {}\nlogin = admin\npassword = admin\nprotocol = {}\nport = {}\nuid = {}\n",
        host, database, protocol, port, userid
    )
}

/// Encrypted preset with blank credentials.
pub fn connection_remote(host: &str, userid: u32) -> String {
    format!(
        "[Connection]\nhostname = {}\ndatabase = \nlogin = \npassword = \nprotocol = jsonrpcs\nport = 443\nuid = {}\n",
        host, userid
    )
}

pub fn cleanup_script(platform: Platform) -> String {
    match platform {
        Platform::Windows => format!("@echo off\n\nset DIR={}\ndel /F /S /Q %DIR%\\*\n", DATA_DIR),
        Platform::Unix => format!(
            "#!/usr/bin/env bash\n\nDIR={}/\nrm -rf --interactive=never $DIR\nmkdir -p $DIR\n",
            DATA_DIR
        ),
    }
}

const PROGRESS_FN: &str = r#"msg() {
    start=$(date +%s.%3N)
    PID=$!
    printf "($PID) {ACTION} ${COLOR}$1${NC} ["
    while kill -0 $PID 2> /dev/null; do
        printf  "▓"
        sleep 1
    done
    end=$(date +%s.%3N)
    runtime=$(python -c "print '%u:%02u' % ((${end} - ${start})/60, (${end} - ${start})%60)")
    printf "] $runtime \n"
}

"#;

const COLORS: &str = "COLOR='\\033[1;32m'\nNC='\\033[0m'\n\n";

/// Last line of the unix transform script. Registration keeps it last.
pub const TRANSFORM_TRAILER: &str = "chmod +x *.sh";

pub fn transform_script(platform: Platform) -> String {
    match platform {
        Platform::Windows => format!(
            "@echo off\n\nset LOGDIR={}\nset DATADIR={}\n\ncall cleanup_data_dir.cmd\n\n\
             REM Add here all transform commands\n\
             REM python my_model.py > %LOGDIR%\\transform_$1_out.log 2> %LOGDIR%\\transform_$1_err.log\n",
            LOG_DIR, DATA_DIR
        ),
        Platform::Unix => {
            let mut s = format!("#!/usr/bin/env bash\n\nLOGDIR={}\nDATADIR={}\n\n", LOG_DIR, DATA_DIR);
            s.push_str(COLORS);
            s.push_str(&PROGRESS_FN.replace("{ACTION}", "Transform"));
            s.push_str(
                "load_script() {\n    #rm -f $DATADIR/*$1*.csv*\n    rm -f $LOGDIR/transform_$1_*.log\n    \
                 python $1.py > $LOGDIR/transform_$1_out.log 2> $LOGDIR/transform_$1_err.log &\n    \
                 msg \"$1\"\n}\n\n",
            );
            s.push_str("./cleanup_data_dir.sh\n\n");
            s.push_str("# Add here all transform commands\n# load_script python_script (without extension)\n");
            s.push_str(TRANSFORM_TRAILER);
            s.push('\n');
            s
        }
    }
}

pub fn load_script(platform: Platform) -> String {
    match platform {
        Platform::Windows => format!(
            "@echo off\n\nset LOGDIR={}\n\nREM Add here all load commands\n\
             REM my_model.cmd > %LOGDIR%\\load_$1_out.log 2> %LOGDIR%\\load_$1_err.log\n",
            LOG_DIR
        ),
        Platform::Unix => {
            let mut s = format!("#!/usr/bin/env bash\n\nLOGDIR={}\n\n", LOG_DIR);
            s.push_str(COLORS);
            s.push_str(
                r#"user_interrupt() {
    echo -e "\n\nKeyboard Interrupt detected."
    echo -e "\nKill import tasks..."
    # Kill the current import
    killall odoo-import-thread.py
    sleep 2
    # Kill the next launched import (--fail)
    killall odoo-import-thread.py
    exit
}

"#,
            );
            s.push_str(&PROGRESS_FN.replace("{ACTION}", "Load"));
            s.push_str(
                "load_script() {\n    # rm -f $LOGDIR/load_$1_*.log\n    \
                 ./$1.sh > $LOGDIR/load_$1_out.log 2> $LOGDIR/load_$1_err.log &\n    msg \"$1\"\n}\n\n",
            );
            s.push_str("trap user_interrupt SIGINT\ntrap user_interrupt SIGTSTP\n\n");
            s.push_str("# Add here all load commands\n# load_script shell_script (without extension)\n");
            s
        }
    }
}

pub fn prefix_py(project_name: &str) -> String {
    format!(
        r#"# -*- coding: utf-8 -*-

# This file defines xml_id prefixes and projectwise variables.

# Defines here a identifier used in the created XML_ID.
project_name = '{}'

# CONSTANTS
COMPANY_ID = 'base.main_company'

# Define here all values in client files considered as TRUE value.
true_values = ['TRUE', 'True', 'true', 'YES', 'Yes', 'yes', 'Y', 'y', '1', '1,0', '1.0']
# Define here all values in client files considered as FALSE value.
false_values = ['FALSE', 'False', 'false', 'NO', 'No', 'no', 'N', 'n', '0', '0,0', '0.0']

# Define the languages used in the import.
# These will be installed by calling install_lang.py
# Key: language code used in the client file
# Value: the Odoo lang code
res_lang_map = {{
#    'E': 'en_US',
}}

# XML ID PREFIXES
"#,
        project_name
    )
}

pub fn mapping_py() -> String {
    String::from(
        "# -*- coding: utf-8 -*-\n\n# This file defines mapping dictionaries.\n\n# MAPPING DICTIONARIES\n\
         # Use odoo_import_scaffold with option --map-selection to\n\
         # automatically build dictionaries of selection fields.\n\n",
    )
}

/// `files.py`. The commented examples are left out when a model is being
/// registered in the same run.
pub fn files_py(with_examples: bool) -> String {
    let mut s = format!(
        "# -*- coding: utf-8 -*-\n\n# This file defines the names of all used files.\n\nimport os\n\n\
         # Folders\nconf_dir = '{}'\ndata_src_dir = '{}'\n\
         data_raw_dir = '%s%s{}%s' % (data_src_dir,os.sep, os.sep)\ndata_dest_dir = '{}'\n\n\
         # Configuration\nconfig_file = os.path.join(conf_dir,'connection.conf')\n\n\
         # Declare here all data files\n",
        CONF_DIR, ORIGIN_DIR, BINARY_DIR, DATA_DIR
    );
    if with_examples {
        s.push_str("# Client file: src_my_model = os.path.join(data_src_dir, 'my_model.csv')\n");
        s.push_str("# Import file: dest_my_model = os.path.join(data_dest_dir, 'my.model.csv')\n");
    }
    s.push('\n');
    s
}

/// Accented characters replaced by `remove_accents`, as (code point, ascii).
const ACCENTS: [(&str, char); 39] = [
    ("xe0", 'a'), ("xe1", 'a'), ("xe2", 'a'), ("xe3", 'a'), ("xe4", 'a'), ("xe5", 'a'),
    ("xc0", 'A'), ("xc1", 'A'), ("xc2", 'A'), ("xc3", 'A'), ("xc4", 'A'), ("xc5", 'A'),
    ("xe8", 'e'), ("xe9", 'e'), ("xea", 'e'), ("xeb", 'e'),
    ("xc8", 'E'), ("xc9", 'E'), ("xca", 'E'), ("xcb", 'E'),
    ("xec", 'i'), ("xed", 'i'), ("xee", 'i'), ("xef", 'i'),
    ("xcc", 'I'), ("xcd", 'I'), ("xce", 'I'), ("xcf", 'I'),
    ("xf2", 'o'), ("xf3", 'o'), ("xf4", 'o'), ("xf5", 'o'), ("xf6", 'o'),
    ("xd2", 'O'), ("xd3", 'O'), ("xd4", 'O'), ("xd5", 'O'), ("xd6", 'O'),
    ("xe7", 'c'),
];

pub fn funclib_py() -> String {
    let mut s = String::from(
        r#"# -*- coding: utf-8 -*-

# This file defines common functions.

from odoo_csv_tools.lib import mapper
from odoo_csv_tools.lib.transform import Processor
from prefix import *
from mapping import *
from datetime import datetime


nvl = lambda a, b: a or b


def keep_numbers(val):
    return filter(lambda x: x.isdigit(), val)


def keep_letters(val):
    return filter(lambda x: x.isalpha(), val)


def remove_accents(val):
    replacements = [
"#,
    );
    for (code, ascii) in ACCENTS {
        s.push_str(&format!("                   (u'\\{}', '{}'),\n", code, ascii));
    }
    s.push_str(
        r#"                   ]
    for a, b in replacements:
        val = val.replace(a, b)
    return val


def keep_column_value(val, column):
    def keep_column_value_fun(line):
        if line[column] != val:
            raise SkippingException("Column %s with wrong value %s" % (column, val))
        return line[column]
    return keep_column_value_fun

"#,
    );
    s
}

pub const CLEAN_DATA_PY: &str = r#"# -*- coding: utf-8 -*-

# This script remove the data created by the import.

import odoolib
from odoo_csv_tools.lib import conf_lib
from prefix import *
from files import *

connection = conf_lib.get_server_connection(config_file)

def delete_model_data(connection, model, demo = False):
    model_model = connection.get_model(model)
    record_ids = model_model.search([])
    if demo:
        print 'Will remove %s records from %s' % (len(record_ids), model)
    else:
        print 'Remove %s records from %s' % (len(record_ids), model)
        model_model.unlink(record_ids)


def delete_xml_id(connection, model, module, demo = False):
    data_model = connection.get_model('ir.model.data')
    data_ids = data_model.search([('module', '=', module), ('model', '=', model)])
    records = data_model.read(data_ids, ['res_id'])
    record_ids = []
    for rec in records:
        record_ids.append(rec['res_id'])
    if demo:
        print 'Will remove %s xml_id %s from %s' % (len(record_ids), module, model)
    else:
        print 'Remove %s xml_id %s from %s' % (len(record_ids), module, model)
        connection.get_model(model).unlink(record_ids)


demo = True

"#;

pub const INSTALL_LANG_PY: &str = r#"# -*- coding: utf-8 -*-

import odoolib
from prefix import *
from files import *
from odoo_csv_tools.lib import conf_lib

connection = conf_lib.get_server_connection(config_file)

model_lang = connection.get_model('base.language.install')

for key in res_lang_map.keys():
    lang = res_lang_map[key]
    res = model_lang.create({'lang': lang})
    model_lang.lang_install(res)
"#;

/// `install_modules.py` or `uninstall_modules.py`.
pub fn module_script(install: bool) -> String {
    let mut s = String::from(
        r#"# -*- coding: utf-8 -*-

import sys
import odoolib
from prefix import *
from files import *
from odoo_csv_tools.lib import conf_lib
from odoo_csv_tools.lib.internal.rpc_thread import RpcThread
from files import config_file

connection = conf_lib.get_server_connection(config_file)

model_module = connection.get_model('ir.module.module')
model_module.update_list()

"#,
    );
    s.push_str(if install {
        "# Set the modules to install\n"
    } else {
        "# Set the modules to uninstall\n"
    });
    s.push_str(
        "module_names = []\n\nmodule_ids = model_module.search_read([['name', 'in', module_names]])\n\n\
         rpc_thread = RpcThread(1)\n\nfor module in module_ids:\n    if module['state'] == 'installed':\n",
    );
    if install {
        s.push_str("        rpc_thread.spawn_thread(model_module.button_immediate_upgrade, [module['id']])\n");
        s.push_str("    else:\n");
        s.push_str("        rpc_thread.spawn_thread(model_module.button_immediate_install, [module['id']])\n");
    } else {
        s.push_str("        rpc_thread.spawn_thread(model_module.button_immediate_uninstall, [module['id']])\n");
    }
    s
}

/// Builder of an `{key: xml_id}` dictionary for an existing model, with the
/// snippets needed to use it in a transform script.
#[allow(clippy::too_many_arguments)]
fn init_map_block(
    function: &str,
    signature: &str,
    comment: &str,
    var: &str,
    model: &str,
    domain: &str,
    key_field: &str,
    usage: &str,
    map_name: &str,
    missing: &str,
) -> String {
    format!(
        r#"def {function}({signature}):
    # Build a dictionary {comment}.
    model_data = connection.get_model('ir.model.data')
    model_{var} = connection.get_model('{model}')
    recs = model_{var}.search_read({domain}, ['id', '{key_field}'])

    res_map = {{}}
    for rec in recs:
        data = model_data.search_read([('res_id', '=', rec['id']), ('model', '=', '{model}')], ['module', 'name'])
        if len(data):
            key = rec['{key_field}'].strip()
            val = '.'.join([data[0]['module'], data[0]['name'] ])
            res_map[key] = val.strip()
        # else:
        #     print {missing}

    if filename:
        with open(filename, 'w') as fp:
            json.dump(res_map, fp)

    return res_map

# Execute mapping
# dummy = {usage}

# Add in files.py
# work_{map_name} = os.path.join(data_src_dir, 'work_{map_name}.json')

# Add in transformation script
# {map_name} = {{}}
# with io.open(work_{map_name}, 'r') as fp:
#     {map_name} = json.load(fp, encoding='utf-8')

"#
    )
}

pub fn init_map_py() -> String {
    let separator = "#".repeat(98);
    let mut s = String::from(
        "# -*- coding: utf-8 -*-\n\nimport odoolib\nfrom prefix import *\nfrom files import *\n\
         from odoo_csv_tools.lib import conf_lib\nimport json\nimport io\n\n\
         connection = conf_lib.get_server_connection(config_file)\n\n",
    );
    s.push_str(&init_map_block(
        "build_map_product_category_id",
        "filename=''",
        "{product_category : xml_id} of all existing product_category",
        "product_category",
        "product.category",
        "[]",
        "name",
        "build_map_product_category_id(work_map_product_category_id)",
        "map_product_category_id",
        "'Product category %s has no XML_ID (id: %s)' % (rec['name'], rec['id'])",
    ));
    s.push_str(
        r#"# Add in transformation script to map 'id' column. REVIEW COLUNM NAME and PREFIX
# def handle_product_category_id(line):
#     categ_name = line['Product Category']
#     try:
#         categ_xml_id = map_product_category_id[categ_name]
#     except:
#         categ_xml_id = mapper.m2o(PREFIX_PRODUCT_CATEGORY, 'Product Category')(line)
#     return categ_xml_id

"#,
    );
    s.push_str(&separator);
    s.push_str("\n\n");
    s.push_str(&init_map_block(
        "build_account_map",
        "company_id, filename=''",
        "{account_code : xml_id} of all existing accounts of a company",
        "account",
        "account.account",
        "[('company_id', '=', company_id)]",
        "code",
        "build_account_map(1, work_map_account_code_id)",
        "map_account_code_id",
        "'Account %s has no XML_ID' % rec['code']",
    ));
    s.push_str(
        r#"# Add in transformation script to map 'id' column. REVIEW COLUNM NAME and PREFIX
# def handle_account_account_id_map(line):
#     code = line['Accounts']
#     try:
#         val = map_account_code_id[code]
#     except:
#         val = mapper.m2o(PREFIX_ACCOUNT_ACCOUNT, 'Accounts')(line)
#     return val

"#,
    );
    s.push_str(&separator);
    s.push_str("\n\n");
    s
}
